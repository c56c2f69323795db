//! Model types - completion request and error types

use crate::types::ChatMessage;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// One chat-completions call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

impl CompletionRequest {
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            max_tokens,
            tools: None,
            tool_choice: None,
        }
    }

    /// Attach tool schemas with automatic tool selection.
    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = Some(tools);
        self.tool_choice = Some("auto".to_string());
        self
    }

    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|tools| !tools.is_empty())
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned HTTP {status}: {body}")]
    Endpoint {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn endpoint(provider: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        Self::Endpoint {
            provider: provider.into(),
            status: status.as_u16(),
            body: body.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Whether the endpoint appears to have rejected the tool schemas.
    pub fn suggests_tool_rejection(&self) -> bool {
        let detail = match self {
            ModelError::Endpoint { body, .. } => body.clone(),
            ModelError::InvalidResponse { reason, .. } => reason.clone(),
            ModelError::Network { source, .. } => source.to_string(),
            ModelError::MissingApiKey { .. } => return false,
        };
        detail.contains("tools") || detail.contains("unmarshal")
    }

    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { .. } => "AI API key not set! Please go to settings.".to_string(),
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not reach the model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("The request to '{provider}' timed out.")
                } else {
                    format!("Network error talking to '{provider}'.")
                }
            }
            ModelError::Endpoint { status, body, .. } => match StatusCode::from_u16(*status) {
                Ok(StatusCode::UNAUTHORIZED) => "The AI API key was rejected.".to_string(),
                Ok(StatusCode::NOT_FOUND) => "The AI endpoint or model was not found.".to_string(),
                Ok(StatusCode::TOO_MANY_REQUESTS) => {
                    "The AI provider is rate limiting requests.".to_string()
                }
                _ => format!("AI request failed ({status}): {body}"),
            },
            ModelError::InvalidResponse { provider, .. } => {
                format!("The response from '{provider}' was not understood.")
            }
        }
    }
}
