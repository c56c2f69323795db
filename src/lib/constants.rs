//! Application constants
//!
//! Single source of truth for paths, defaults and protocol identifiers.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/agent.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Where the settings record is persisted unless configured otherwise
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.toml";

/// Environment variable overriding `rest.admin_key`
pub const ADMIN_KEY_ENV: &str = "AGENT_ADMIN_KEY";

pub const DEFAULT_REST_ADDR: &str = "127.0.0.1:8080";

pub const DEFAULT_DIRECTUS_URL: &str = "http://localhost:8055";
pub const DEFAULT_AI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

pub const DEFAULT_HANDSHAKE_DELAY_MS: u64 = 3_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_SERVER_NAME: &str = "directus";
pub const DEFAULT_SERVER_COMMAND: &str = "npx";
pub const DEFAULT_SERVER_ARGS: &[&str] = &["-y", "@directus/content-mcp@latest"];

/// Environment variables the tool server reads its target from
pub const ENV_DIRECTUS_URL: &str = "DIRECTUS_URL";
pub const ENV_DIRECTUS_TOKEN: &str = "DIRECTUS_TOKEN";

/// MCP protocol revision announced in the handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const CLIENT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
