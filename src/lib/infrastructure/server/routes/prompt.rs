use super::super::auth::AdminAccess;
use super::super::dto::{ErrorResponse, PromptRequest, PromptResponse};
use super::super::error::{ApiError, api_error};
use super::super::extract::ApiJson;
use super::super::state::ServerState;
use crate::agent::{Agent, AgentOptions};
use crate::application::tooling::ToolServerInterface;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{error, info};

/// Run one orchestration loop for `prompt`.
#[utoipa::path(
    post,
    path = "/prompt",
    tag = "agent",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Agent run finished", body = PromptResponse),
        (status = 400, description = "Prompt or AI API key missing", body = ErrorResponse),
        (status = 403, description = "Admin privilege required", body = ErrorResponse),
        (status = 500, description = "Tool server or model failure", body = ErrorResponse)
    ),
    security(("admin_key" = []))
)]
pub async fn prompt_handler(
    State(state): State<Arc<ServerState>>,
    _admin: AdminAccess,
    ApiJson(payload): ApiJson<PromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    let Some(prompt) = payload.prompt.filter(|prompt| !prompt.trim().is_empty()) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Prompt is required"));
    };

    let settings = state.settings().load().await;
    if !settings.has_api_key() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "AI API Key is required in settings",
        ));
    }

    info!(
        directus_url = settings.directus_url.as_str(),
        token = %settings.token_preview(),
        "Ensuring tool server connection"
    );
    let session = state.session();
    if let Err(err) = session
        .connect(&settings.directus_url, &settings.admin_token)
        .await
    {
        error!(%err, "Tool server connection failed");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.user_message(),
        ));
    }

    let provider = state.providers().create(&settings).map_err(|err| {
        error!(%err, "Could not build model provider");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
    })?;

    let tools: Arc<dyn ToolServerInterface> = session;
    let agent = Agent::new(provider, tools);
    let options = AgentOptions::new(settings.ai_model.clone(), state.llm());

    match agent.run(prompt, &options).await {
        Ok(outcome) => {
            info!(
                iterations = outcome.iterations,
                steps = outcome.steps.len(),
                cap_reached = outcome.cap_reached,
                "Agent run completed"
            );
            Ok(Json(PromptResponse::from(outcome)))
        }
        Err(err) => {
            error!(%err, "Agent run failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(err.user_message()).with_iterations(err.iterations())),
            ))
        }
    }
}
