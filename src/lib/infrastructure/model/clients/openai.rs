//! OpenAI-compatible chat-completions client

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::AgentSettings;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{CompletionRequest, ModelError};
use crate::types::ChatMessage;

const PROVIDER_ID: &str = "openai";
const COMPLETIONS_PATH: &str = "/chat/completions";

/// OpenAI-compatible client (works with OpenAI, Groq, Ollama's `/v1`, etc.)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
}

impl OpenAIClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base: HttpClientBase::new(PROVIDER_ID.to_string(), base_url.into(), api_key),
        }
    }

    pub fn from_settings(settings: &AgentSettings) -> Self {
        let api_key = settings
            .has_api_key()
            .then(|| settings.ai_api_key.clone());
        Self::new(settings.effective_base_url(), api_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.base.endpoint
    }
}

#[async_trait]
impl ModelProvider for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ModelError> {
        let url = self.base.build_url(COMPLETIONS_PATH);

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.has_tools(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: CompletionResponse = self.base.post_with_bearer(&url, &request).await?;
        debug!("Received response from OpenAI-compatible provider");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use httpmock::prelude::*;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest::new("gpt-4o-mini", vec![ChatMessage::user("list collections")], 0.3, 2000)
    }

    #[tokio::test]
    async fn posts_bearer_request_and_returns_assistant_turn() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body_includes(json!({"tool_choice": "auto"}).to_string());
            then.status(200).json_body(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "read-collections", "arguments": "{}"}
                        }]
                    }
                }]
            }));
        });

        let client = OpenAIClient::new(format!("{}/v1", server.base_url()), Some("sk-test".into()));
        let message = client
            .complete(request().with_tools(vec![json!({"type": "function"})]))
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.tool_calls[0].function.name, "read-collections");
    }

    #[tokio::test]
    async fn error_status_keeps_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(400)
                .body(r#"{"error":{"message":"model does not support tools"}}"#);
        });

        let client = OpenAIClient::new(server.base_url(), Some("sk-test".into()));
        let err = client.complete(request()).await.expect_err("400");
        assert!(matches!(err, ModelError::Endpoint { status: 400, .. }));
        assert!(err.suggests_tool_rejection());
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let client = OpenAIClient::new("http://127.0.0.1:9", None);
        let err = client.complete(request()).await.expect_err("no key");
        assert!(matches!(err, ModelError::MissingApiKey { .. }));
    }

    #[tokio::test]
    async fn empty_choices_is_invalid() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let client = OpenAIClient::new(server.base_url(), Some("sk-test".into()));
        let err = client.complete(request()).await.expect_err("invalid");
        assert!(matches!(err, ModelError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn null_tool_calls_is_a_plain_answer() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "Here are your articles.",
                        "tool_calls": null
                    }
                }]
            }));
        });

        let client = OpenAIClient::new(server.base_url(), Some("sk-test".into()));
        let message = client.complete(request()).await.expect("completion");
        assert!(!message.has_tool_calls());
        assert_eq!(message.text(), Some("Here are your articles."));
    }
}
