use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "directus-agent",
    version,
    about = "LLM agent that operates a Directus backend through the content MCP server"
)]
pub struct Cli {
    /// Configuration file path (defaults to config/agent.toml)
    #[arg(long)]
    pub config: Option<String>,
    #[arg(long, short, value_enum, default_value_t = RunMode::Rest)]
    pub mode: RunMode,
    /// REST bind address (overrides `[rest].addr`)
    #[arg(long)]
    pub rest_addr: Option<SocketAddr>,
    /// Prompt for `--mode prompt`
    #[arg()]
    pub prompt: Vec<String>,
}

impl Cli {
    /// Trailing prompt words joined, `None` when blank.
    pub fn prompt_text(&self) -> Option<String> {
        let joined = self.prompt.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RunMode {
    /// REST API server
    Rest,
    /// Run a single prompt and print the outcome as JSON
    Prompt,
}
