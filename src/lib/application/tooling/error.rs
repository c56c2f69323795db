use thiserror::Error;

/// Failures of the tool-server transport.
///
/// `Clone` so one connect attempt can hand the identical outcome to every
/// caller that joined it.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Directus access token is required before the tool server can start")]
    CredentialMissing,
    #[error("failed to spawn tool server '{server}': {message}")]
    SpawnFailure { server: String, message: String },
    #[error("tool server '{server}' failed during handshake: {reason}")]
    HandshakeFatal { server: String, reason: String },
    #[error("tool server '{server}' did not initialise within {timeout_ms} ms")]
    ConnectTimeout { server: String, timeout_ms: u128 },
    #[error("tool server is not connected")]
    NotConnected,
    #[error("request {id} ({method}) timed out after {timeout_ms} ms")]
    RequestTimeout {
        method: String,
        id: u64,
        timeout_ms: u128,
    },
    #[error("{method} failed: {message}")]
    ToolProtocol {
        method: String,
        code: Option<i64>,
        message: String,
    },
    #[error("tool server output stream closed")]
    StreamClosed,
    #[error("request {id} was discarded when the connection was torn down")]
    Discarded { id: u64 },
    #[error("connection attempt was discarded by a disconnect")]
    Superseded,
    #[error("failed to write to tool server: {message}")]
    Write { message: String },
}

impl TransportError {
    /// Failures that happen before the connection is usable.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            TransportError::CredentialMissing
                | TransportError::SpawnFailure { .. }
                | TransportError::HandshakeFatal { .. }
                | TransportError::ConnectTimeout { .. }
                | TransportError::Superseded
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            TransportError::CredentialMissing => {
                "Admin token not set! Please go to settings.".to_string()
            }
            TransportError::SpawnFailure { .. } => {
                "The content tool server could not be started.".to_string()
            }
            TransportError::HandshakeFatal { reason, .. } => {
                format!("MCP Fatal Error: {reason}")
            }
            TransportError::ConnectTimeout { timeout_ms, .. } => {
                format!("MCP connection timeout after {timeout_ms}ms")
            }
            other => other.to_string(),
        }
    }
}

/// A tool call whose argument payload could not be decoded.
#[derive(Debug, Error)]
#[error("invalid arguments for tool '{tool}': {source}")]
pub struct ArgumentError {
    pub tool: String,
    #[source]
    pub source: serde_json::Error,
}
