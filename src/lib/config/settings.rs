use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::{DEFAULT_AI_BASE_URL, DEFAULT_AI_MODEL, DEFAULT_DIRECTUS_URL};

/// The single agent settings record edited through `/settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentSettings {
    pub directus_url: String,
    /// Directus access token handed to the tool server.
    #[serde(default)]
    pub admin_token: String,
    pub ai_model: String,
    pub ai_base_url: String,
    #[serde(default)]
    pub ai_api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            directus_url: DEFAULT_DIRECTUS_URL.to_string(),
            admin_token: String::new(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            ai_api_key: String::new(),
            updated_at: None,
        }
    }
}

impl AgentSettings {
    pub fn has_admin_token(&self) -> bool {
        !self.admin_token.trim().is_empty()
    }

    pub fn has_api_key(&self) -> bool {
        !self.ai_api_key.trim().is_empty()
    }

    /// Base URL for the chat-completions endpoint, falling back to OpenAI.
    pub fn effective_base_url(&self) -> &str {
        let trimmed = self.ai_base_url.trim();
        if trimmed.is_empty() {
            DEFAULT_AI_BASE_URL
        } else {
            trimmed
        }
    }

    /// Loggable hint about the token without revealing it.
    pub fn token_preview(&self) -> String {
        if !self.has_admin_token() {
            return "NOT SET".to_string();
        }
        let prefix: String = self.admin_token.trim().chars().take(4).collect();
        format!("SET ({prefix}...)")
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(value) = update.directus_url {
            self.directus_url = value;
        }
        if let Some(value) = update.admin_token {
            self.admin_token = value;
        }
        if let Some(value) = update.ai_model {
            self.ai_model = value;
        }
        if let Some(value) = update.ai_base_url {
            self.ai_base_url = value;
        }
        if let Some(value) = update.ai_api_key {
            self.ai_api_key = value;
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SettingsUpdate {
    pub directus_url: Option<String>,
    pub admin_token: Option<String>,
    pub ai_model: Option<String>,
    pub ai_base_url: Option<String>,
    pub ai_api_key: Option<String>,
}
