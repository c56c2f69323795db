use super::super::dto::HealthResponse;
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service liveness and tool-server state", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let session = state.session();
    Json(HealthResponse {
        status: "ok".to_string(),
        mcp_connected: session.is_connected(),
        settings_loaded: state.settings().is_loaded(),
        mcp_status: session.status(),
    })
}
