pub mod application;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, tooling};
pub use cli::{Cli, RunMode};
pub use config::AppConfig;
pub use domain::types;
pub use infrastructure::{model, server};

use agent::{Agent, AgentOptions};
use config::SettingsStore;
use model::{OpenAIProviderFactory, ProviderFactory};
use serde_json::json;
use server::ServerState;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tooling::{McpSession, ToolServerInterface};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting directus-agent");
    debug!(mode = ?cli.mode, config = ?cli.config, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let file_config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration from default path");
    }

    let settings = Arc::new(SettingsStore::open(&file_config.settings_path));
    let session = Arc::new(McpSession::new(
        file_config.server.clone(),
        file_config.transport,
    ));

    match cli.mode {
        RunMode::Rest => {
            let addr = cli.rest_addr.unwrap_or(file_config.rest.addr);
            if file_config.rest.admin_key.is_none() {
                warn!("No admin key configured; privileged routes will answer 403");
            }
            let state = Arc::new(ServerState::new(
                settings,
                Arc::clone(&session),
                Arc::new(OpenAIProviderFactory),
                file_config.llm.clone(),
                file_config.rest.admin_key.clone(),
            ));
            info!(addr = %addr, "Starting REST server");
            let served = server::serve(state, addr, &file_config.rest.cors_origins).await;
            session.disconnect().await;
            served?;
        }
        RunMode::Prompt => {
            let prompt = cli
                .prompt_text()
                .ok_or("prompt required as trailing arguments")?;
            let result = run_prompt(&file_config, &settings, &session, prompt).await;
            session.disconnect().await;
            result?;
        }
    }
    info!("directus-agent finished");
    Ok(())
}

async fn run_prompt(
    config: &AppConfig,
    settings: &SettingsStore,
    session: &Arc<McpSession>,
    prompt: String,
) -> Result<(), Box<dyn Error>> {
    let current = settings.load().await;
    info!(
        directus_url = current.directus_url.as_str(),
        token = %current.token_preview(),
        "Connecting to tool server"
    );
    let provider = OpenAIProviderFactory.create(&current)?;
    session
        .connect(&current.directus_url, &current.admin_token)
        .await
        .map_err(|err| err.user_message())?;

    let tools: Arc<dyn ToolServerInterface> = session.clone();
    let agent = Agent::new(provider, tools);
    let options = AgentOptions::new(current.ai_model.clone(), &config.llm);
    let outcome = agent.run(prompt, &options).await?;

    let output = json!({
        "response": outcome.response,
        "iterations": outcome.iterations,
        "note": outcome.note,
        "steps": outcome.steps,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
