use async_trait::async_trait;
use serde_json::Value;

use super::error::TransportError;

/// Seam between the orchestration loop and whatever executes tools.
#[async_trait]
pub trait ToolServerInterface: Send + Sync {
    /// Invoke `tool` with `arguments`; returns the raw `result` object.
    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, TransportError>;
}
