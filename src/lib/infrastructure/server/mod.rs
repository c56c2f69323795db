mod auth;
mod docs;
mod dto;
mod error;
mod extract;
mod router;
mod routes;
mod state;

pub use auth::AdminAccess;
pub use dto::{
    ErrorResponse, HealthResponse, PromptRequest, PromptResponse, SettingsResponse,
    SettingsSavedResponse,
};
pub use error::ServerError;
pub use extract::ApiJson;
pub use router::build_router;
pub use state::ServerState;

use std::net::SocketAddr;
use std::sync::Arc;

pub async fn serve(
    state: Arc<ServerState>,
    addr: SocketAddr,
    cors_origins: &[String],
) -> Result<(), ServerError> {
    router::serve(state, addr, cors_origins).await
}
