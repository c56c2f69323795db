//! Provider factory - builds a model client from the current settings

use super::clients::OpenAIClient;
use super::traits::ModelProvider;
use super::types::ModelError;
use crate::config::AgentSettings;
use std::sync::Arc;

/// Creates the model provider for one orchestration run.
///
/// Settings can change between runs, so providers are built per request.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, settings: &AgentSettings) -> Result<Arc<dyn ModelProvider>, ModelError>;
}

/// Builds [`OpenAIClient`]s against the configured base URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIProviderFactory;

impl ProviderFactory for OpenAIProviderFactory {
    fn create(&self, settings: &AgentSettings) -> Result<Arc<dyn ModelProvider>, ModelError> {
        if !settings.has_api_key() {
            return Err(ModelError::missing_api_key("openai"));
        }
        Ok(Arc::new(OpenAIClient::from_settings(settings)))
    }
}
