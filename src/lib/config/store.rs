use super::error::ConfigError;
use super::settings::{AgentSettings, SettingsUpdate};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Holds the agent settings record and persists it as TOML.
///
/// Reads never fail: a missing or unreadable file leaves the defaults in
/// place and `is_loaded` reports false until the first successful upsert.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<AgentSettings>,
    loaded: AtomicBool,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (settings, loaded) = match read_settings(&path) {
            Ok(settings) => {
                info!(path = %path.display(), "Settings loaded from disk");
                (settings, true)
            }
            Err(ConfigError::NotFound { .. }) => {
                debug!(path = %path.display(), "No stored settings, using defaults");
                (AgentSettings::default(), false)
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Settings unreadable, using defaults");
                (AgentSettings::default(), false)
            }
        };

        Self {
            path,
            current: RwLock::new(settings),
            loaded: AtomicBool::new(loaded),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> AgentSettings {
        self.current.read().await.clone()
    }

    /// Whether a stored record backs the current settings.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Merge `update` into the stored record and write it out.
    pub async fn upsert(&self, update: SettingsUpdate) -> Result<AgentSettings, ConfigError> {
        let mut current = self.current.write().await;
        let mut next = current.clone();
        next.apply(update);
        next.updated_at = Some(Utc::now());

        let encoded = toml::to_string_pretty(&next)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, encoded)
            .await
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;

        *current = next.clone();
        self.loaded.store(true, Ordering::SeqCst);
        info!(
            path = %self.path.display(),
            directus_url = next.directus_url.as_str(),
            token = %next.token_preview(),
            "Settings saved"
        );
        Ok(next)
    }
}

fn read_settings(path: &Path) -> Result<AgentSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
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
