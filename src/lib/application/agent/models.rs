use crate::config::LlmConfig;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Parameters fixed for one orchestration run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: usize,
}

impl AgentOptions {
    pub fn new(model: impl Into<String>, llm: &LlmConfig) -> Self {
        Self {
            model: model.into(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            max_iterations: llm.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentOutcome {
    pub response: String,
    pub iterations: usize,
    /// Set when the answer came from a degraded path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// The iteration cap ended the run before a textual answer.
    pub cap_reached: bool,
    pub steps: Vec<AgentStep>,
}

/// One tool invocation performed during a run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentStep {
    pub iteration: usize,
    pub tool: String,
    #[schema(value_type = Object)]
    pub arguments: Value,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub extracted_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Issued by the text fallback rather than a structured tool call.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub manual: bool,
}
