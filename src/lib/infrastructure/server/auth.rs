//! Administrative privilege check for the REST surface.

use super::error::{ApiError, api_error};
use super::state::ServerState;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;
use tracing::warn;

/// Present only when the request carried `Authorization: Bearer <admin key>`.
///
/// With no admin key configured every privileged request is refused.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

impl AdminAccess {
    pub(crate) fn verify(state: &ServerState, parts: &Parts) -> bool {
        let Some(expected) = state.admin_key() else {
            return false;
        };
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token.trim() == expected)
    }
}

impl FromRequestParts<Arc<ServerState>> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        if Self::verify(state, parts) {
            return Ok(AdminAccess);
        }
        warn!(path = parts.uri.path(), "Rejected request without admin privilege");
        let message = match parts.uri.path() {
            "/prompt" => "Admin access required to use AI Agent",
            _ if parts.method == axum::http::Method::GET => "Admin access required to view settings",
            _ => "Admin access required to update settings",
        };
        Err(api_error(StatusCode::FORBIDDEN, message))
    }
}
