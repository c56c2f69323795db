//! Model traits

use super::types::{CompletionRequest, ModelError};
use crate::types::ChatMessage;
use async_trait::async_trait;

/// A chat-completions endpoint.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Run one completion and return the assistant turn verbatim.
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ModelError>;
}
