use crate::infrastructure::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model call failed at iteration {iterations}: {source}")]
    Model {
        iterations: usize,
        #[source]
        source: ModelError,
    },
    #[error("text-only retry failed at iteration {iterations}: {source}")]
    Fallback {
        iterations: usize,
        #[source]
        source: ModelError,
    },
}

impl AgentError {
    /// Iteration the run had reached when it failed.
    pub fn iterations(&self) -> usize {
        match self {
            AgentError::Model { iterations, .. } | AgentError::Fallback { iterations, .. } => {
                *iterations
            }
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model { source, .. } | AgentError::Fallback { source, .. } => {
                source.user_message()
            }
        }
    }
}
