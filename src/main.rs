mod application;
mod config;
mod domain;
mod infrastructure;

use application::agent::{Agent, CredentialPool};
use clap::Parser;
use config::AppConfig;
use infrastructure::model::GeminiClient;
use serde_json::json;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "steploop",
    version,
    about = "Step-protocol coding agent powered by Gemini"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<String>,
    /// Override the configured model
    #[arg(long)]
    model: Option<String>,
    /// Override the configured step budget
    #[arg(long)]
    max_steps: Option<usize>,
    /// Read the request from a file instead of the arguments
    #[arg(long)]
    prompt_file: Option<String>,
    /// The request, as free-form words
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    init_tracing();
    info!("Starting steploop");

    let cli = Cli::parse();
    debug!(config = ?cli.config, model = ?cli.model, max_steps = ?cli.max_steps, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let file_config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    }

    let mut options = file_config.agent_options();
    if let Some(model) = cli.model.clone() {
        options.model = model;
    }
    if let Some(max_steps) = cli.max_steps {
        options.max_steps = max_steps;
    }

    let pool = CredentialPool::from_env(config::CREDENTIAL_ENV_PREFIX);
    info!(credentials = pool.len(), "Loaded credential pool from environment");

    // The template client carries no key; the run binds one from the pool.
    let provider = GeminiClient::new(file_config.endpoint.clone(), "");
    let agent = Agent::new(provider, pool, options);

    // Process-level interrupt exits immediately; there is nothing to clean up.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted; shutting down");
            std::process::exit(130);
        }
    });

    let query = load_prompt(&cli)?;
    info!(query = query.as_str(), "Processing request");

    match agent.run(query).await {
        Ok(outcome) => {
            let output = json!({
                "run_id": outcome.run_id,
                "status": outcome.status,
                "response": outcome.response,
                "steps": outcome.steps,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            info!("Agent session finished");
            Ok(())
        }
        Err(err) => {
            error!(%err, "Agent run failed");
            eprintln!("{}", err.user_message());
            Err(err.into())
        }
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return Ok(normalize_prompt(content));
    }

    if !cli.prompt.is_empty() {
        let joined = cli.prompt.join(" ");
        return Ok(normalize_prompt(joined));
    }

    if atty::isnt(atty::Stream::Stdin) {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        if !buffer.trim().is_empty() {
            return Ok(normalize_prompt(buffer));
        }
    }

    warn!("No prompt provided; using the built-in default request");
    Ok(config::DEFAULT_QUERY.to_string())
}

fn normalize_prompt(prompt: String) -> String {
    prompt.trim().to_string()
}
