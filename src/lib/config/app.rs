use super::error::ConfigError;
use super::server::ServerConfig;
use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HANDSHAKE_DELAY_MS, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MAX_TOKENS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_REST_ADDR, DEFAULT_SETTINGS_PATH,
    DEFAULT_TEMPERATURE,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration loaded from agent.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rest: RestConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub transport: TransportConfig,
    pub settings_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rest: RestConfig::default(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            transport: TransportConfig::default(),
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    pub addr: SocketAddr,
    /// Bearer secret that grants administrative privilege on the REST surface.
    pub admin_key: Option<String>,
    pub cors_origins: Vec<String>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_REST_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080))),
            admin_key: None,
            cors_origins: vec!["http://localhost:8055".to_string()],
        }
    }
}

/// Completion parameters fixed for every orchestration run.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// The three independent transport timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Grace period between spawn and the `initialize` request.
    pub handshake_delay: Duration,
    /// Upper bound on the whole connect attempt, grace delay included.
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            handshake_delay: Duration::from_millis(DEFAULT_HANDSHAKE_DELAY_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}
