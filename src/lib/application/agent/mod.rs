//! # Agent Module
//!
//! Drives a bounded multi-turn exchange with the model: the conversation
//! and tool schemas go out, tool calls come back and are dispatched through
//! a [`ToolServerInterface`](crate::application::tooling::ToolServerInterface),
//! and normalized results are folded back in until the model answers in
//! text or the iteration cap is reached.

mod errors;
mod fallback;
mod instructions;
mod models;
mod runner;

pub use errors::AgentError;
pub use fallback::{manual_read_collection, mentions_tool};
pub use instructions::{CAP_RESPONSE, EMPTY_RESPONSE, SYSTEM_INSTRUCTIONS, TEXT_ONLY_NOTE};
pub use models::{AgentOptions, AgentOutcome, AgentStep};
pub use runner::Agent;
