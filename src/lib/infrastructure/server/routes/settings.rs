use super::super::auth::AdminAccess;
use super::super::dto::{ErrorResponse, SettingsResponse, SettingsSavedResponse};
use super::super::error::{ApiError, api_error};
use super::super::extract::ApiJson;
use super::super::state::ServerState;
use crate::config::SettingsUpdate;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{error, info};

#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Current agent settings", body = SettingsResponse),
        (status = 403, description = "Admin privilege required", body = ErrorResponse)
    ),
    security(("admin_key" = []))
)]
pub async fn settings_get_handler(
    State(state): State<Arc<ServerState>>,
    _admin: AdminAccess,
) -> Json<SettingsResponse> {
    let data = state.settings().load().await;
    Json(SettingsResponse {
        success: true,
        data,
    })
}

/// Upsert the settings record and drop the tool-server connection so the
/// next prompt reconnects with the new values.
#[utoipa::path(
    post,
    path = "/settings",
    tag = "settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Settings saved", body = SettingsSavedResponse),
        (status = 403, description = "Admin privilege required", body = ErrorResponse),
        (status = 500, description = "Settings could not be persisted", body = ErrorResponse)
    ),
    security(("admin_key" = []))
)]
pub async fn settings_post_handler(
    State(state): State<Arc<ServerState>>,
    _admin: AdminAccess,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> Result<Json<SettingsSavedResponse>, ApiError> {
    let data = state.settings().upsert(update).await.map_err(|err| {
        error!(%err, "Failed to save settings");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })?;

    state.session().disconnect().await;
    info!(
        directus_url = data.directus_url.as_str(),
        token = %data.token_preview(),
        model = data.ai_model.as_str(),
        "Settings updated, tool server will reconnect on next prompt"
    );

    Ok(Json(SettingsSavedResponse {
        success: true,
        message: "Settings saved".to_string(),
        data,
    }))
}
