pub mod app;
pub mod error;
pub mod loader;
pub mod server;
pub mod settings;
pub mod store;

pub use crate::constants::CONFIG_PATH;

pub use app::{AppConfig, LlmConfig, RestConfig, TransportConfig};
pub use error::ConfigError;
pub use server::ServerConfig;
pub use settings::{AgentSettings, SettingsUpdate};
pub use store::SettingsStore;
