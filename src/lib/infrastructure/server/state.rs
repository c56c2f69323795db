use crate::application::tooling::McpSession;
use crate::config::{LlmConfig, SettingsStore};
use crate::model::ProviderFactory;
use std::sync::Arc;

/// Everything a request handler needs; shared across requests.
pub struct ServerState {
    settings: Arc<SettingsStore>,
    session: Arc<McpSession>,
    providers: Arc<dyn ProviderFactory>,
    llm: LlmConfig,
    admin_key: Option<String>,
}

impl ServerState {
    pub fn new(
        settings: Arc<SettingsStore>,
        session: Arc<McpSession>,
        providers: Arc<dyn ProviderFactory>,
        llm: LlmConfig,
        admin_key: Option<String>,
    ) -> Self {
        let admin_key = admin_key.filter(|key| !key.trim().is_empty());
        Self {
            settings,
            session,
            providers,
            llm,
            admin_key,
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn session(&self) -> Arc<McpSession> {
        Arc::clone(&self.session)
    }

    pub fn providers(&self) -> &dyn ProviderFactory {
        self.providers.as_ref()
    }

    pub fn llm(&self) -> &LlmConfig {
        &self.llm
    }

    pub(crate) fn admin_key(&self) -> Option<&str> {
        self.admin_key.as_deref()
    }
}
