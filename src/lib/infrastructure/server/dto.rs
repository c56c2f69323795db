use crate::agent::{AgentOutcome, AgentStep};
use crate::application::tooling::ConnectionStatus;
use crate::config::AgentSettings;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            iterations: None,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub success: bool,
    pub data: AgentSettings,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsSavedResponse {
    pub success: bool,
    pub message: String,
    pub data: AgentSettings,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromptResponse {
    pub success: bool,
    pub response: String,
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub cap_reached: bool,
    pub steps: Vec<AgentStep>,
}

impl From<AgentOutcome> for PromptResponse {
    fn from(outcome: AgentOutcome) -> Self {
        Self {
            success: true,
            response: outcome.response,
            iterations: outcome.iterations,
            note: outcome.note,
            cap_reached: outcome.cap_reached,
            steps: outcome.steps,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub mcp_connected: bool,
    pub settings_loaded: bool,
    pub mcp_status: ConnectionStatus,
}
