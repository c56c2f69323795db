use super::app::{AppConfig, LlmConfig, RestConfig, TransportConfig};
use super::error::ConfigError;
use super::server::{RawServer, ServerConfig};
use crate::constants::{ADMIN_KEY_ENV, CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub rest: RawRest,
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub transport: RawTransport,
    pub settings_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawRest {
    pub addr: Option<String>,
    pub admin_key: Option<String>,
    pub cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawLlm {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawTransport {
    pub handshake_delay_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate configuration from a file path.
///
/// A missing file at the default location yields defaults; a missing file
/// that was asked for explicitly is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));

    let mut config = match read_raw(config_path) {
        Ok(raw) => validate_and_build(raw)?,
        Err(ConfigError::NotFound { .. }) if !explicit => {
            info!(path = %config_path.display(), "No configuration file, using defaults");
            AppConfig::default()
        }
        Err(error) => return Err(error),
    };

    if let Ok(key) = std::env::var(ADMIN_KEY_ENV) {
        if !key.trim().is_empty() {
            debug!("Admin key taken from environment");
            config.rest.admin_key = Some(key);
        }
    }

    Ok(config)
}

/// Parse configuration from TOML text without touching the filesystem.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    validate_and_build(parsed)
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    debug!(path = %path.display(), "Reading agent configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();

    let addr = match parsed.rest.addr {
        Some(addr) => addr
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::invalid("rest.addr", err.to_string()))?,
        None => defaults.rest.addr,
    };
    let admin_key = parsed
        .rest
        .admin_key
        .map(|key| shellexpand::env(&key).map(|k| k.into_owned()).unwrap_or(key))
        .filter(|key| !key.trim().is_empty());
    let rest = RestConfig {
        addr,
        admin_key,
        cors_origins: parsed.rest.cors_origins.unwrap_or(defaults.rest.cors_origins),
    };

    let llm = LlmConfig {
        temperature: parsed.llm.temperature.unwrap_or(defaults.llm.temperature),
        max_tokens: parsed.llm.max_tokens.unwrap_or(defaults.llm.max_tokens),
        max_iterations: parsed
            .llm
            .max_iterations
            .unwrap_or(defaults.llm.max_iterations),
    };
    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::invalid(
            "llm.temperature",
            format!("{} is outside 0.0..=2.0", llm.temperature),
        ));
    }
    if llm.max_iterations == 0 {
        return Err(ConfigError::invalid("llm.max_iterations", "must be at least 1"));
    }
    if llm.max_tokens == 0 {
        return Err(ConfigError::invalid("llm.max_tokens", "must be at least 1"));
    }

    let transport = TransportConfig {
        handshake_delay: millis_or(
            parsed.transport.handshake_delay_ms,
            defaults.transport.handshake_delay,
        ),
        connect_timeout: millis_or(
            parsed.transport.connect_timeout_ms,
            defaults.transport.connect_timeout,
        ),
        request_timeout: millis_or(
            parsed.transport.request_timeout_ms,
            defaults.transport.request_timeout,
        ),
    };
    if transport.connect_timeout.is_zero() || transport.request_timeout.is_zero() {
        return Err(ConfigError::invalid("transport", "timeouts must be non-zero"));
    }
    if transport.handshake_delay >= transport.connect_timeout {
        return Err(ConfigError::invalid(
            "transport.handshake_delay_ms",
            "must be shorter than connect_timeout_ms",
        ));
    }

    Ok(AppConfig {
        rest,
        server: ServerConfig::from(parsed.server),
        llm,
        transport,
        settings_path: parsed
            .settings_path
            .map(PathBuf::from)
            .unwrap_or(defaults.settings_path),
    })
}

fn millis_or(value: Option<u64>, fallback: Duration) -> Duration {
    value.map(Duration::from_millis).unwrap_or(fallback)
}
