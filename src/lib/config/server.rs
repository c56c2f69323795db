use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::constants::{DEFAULT_SERVER_ARGS, DEFAULT_SERVER_COMMAND, DEFAULT_SERVER_NAME};

/// How to launch the content MCP server subprocess.
///
/// The Directus URL and token are not part of this record; they come from the
/// agent settings and are injected at spawn time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            command: PathBuf::from(DEFAULT_SERVER_COMMAND),
            args: DEFAULT_SERVER_ARGS.iter().map(|arg| arg.to_string()).collect(),
            env: HashMap::new(),
            workdir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawServer {
    name: Option<String>,
    command: Option<String>,
    args: Option<Vec<String>>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
}

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };
        let defaults = ServerConfig::default();

        let command = raw
            .command
            .map(|command| PathBuf::from(expand(&command)))
            .unwrap_or(defaults.command);
        let args = raw
            .args
            .map(|args| args.iter().map(|arg| expand(arg)).collect())
            .unwrap_or(defaults.args);
        let workdir = raw.workdir.map(|dir| PathBuf::from(expand(&dir)));

        Self {
            name: raw.name.unwrap_or(defaults.name),
            command,
            args,
            env: raw.env,
            workdir,
        }
    }
}
