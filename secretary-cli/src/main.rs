//! CLI entry point for the AI secretary

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use secretary_agent::{Assistant, MODEL, SYSTEM_PROMPT};
use secretary_core::config::{Config, ConfigLoader};
use secretary_core::logging::init_logging;
use secretary_core::pricing::round_usd;
use secretary_core::SessionStore;
use secretary_providers::OpenAIClient;
use secretary_server::{run_server, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "secretary")]
#[command(about = "A session-aware AI secretary over HTTP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Address to bind, overrides gateway.host
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides gateway.port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send a single message and print the reply
    Chat {
        /// Message to send
        #[arg(short, long)]
        message: String,
        /// Session identifier
        #[arg(short, long, default_value = "default")]
        session: String,
    },
    /// Show status information
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = config_loader.load()?;

    let _log_guard = init_logging(&config.logging);

    match cli.command {
        Commands::Serve { host, port } => {
            info!("Starting gateway");
            run_serve(&config, host, port).await?;
        }
        Commands::Chat { message, session } => {
            run_chat(&config, &session, &message).await?;
        }
        Commands::Status => {
            run_status(&config_loader, &config);
        }
    }

    Ok(())
}

fn build_assistant(config: &Config) -> Arc<Assistant> {
    let openai = &config.providers.openai;
    let provider = Arc::new(OpenAIClient::new(
        openai.api_key(),
        openai.api_base(),
        MODEL.to_string(),
        openai.extra_headers(),
    ));
    let sessions = Arc::new(SessionStore::new(SYSTEM_PROMPT));

    Arc::new(
        Assistant::new(sessions, provider)
            .with_history(&config.history)
            .with_params(&config.assistant),
    )
}

async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address found for {}:{}", host, port))
}

async fn run_serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.gateway.host.clone());
    let port = port.unwrap_or(config.gateway.port);
    let addr = resolve_addr(&host, port).await?;

    if config.providers.openai.api_key().is_none() {
        error!("No OpenAI API key configured; /chat requests will fail");
    }

    let state = AppState::new(build_assistant(config));

    println!(
        "{} listening on http://{}",
        style("AI secretary").bold().cyan(),
        addr
    );

    run_server(state, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await
}

async fn run_chat(config: &Config, session: &str, message: &str) -> Result<()> {
    let assistant = build_assistant(config);
    let outcome = assistant.handle(session, message).await?;

    println!("{}", outcome.answer);
    println!();
    println!(
        "{} {} in / {} out, ${}",
        style("usage:").dim(),
        outcome.input_tokens,
        outcome.output_tokens,
        round_usd(outcome.cost_usd)
    );

    Ok(())
}

fn run_status(loader: &ConfigLoader, config: &Config) {
    println!("{}", style("AI Secretary Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!("  Model: {}", MODEL);
    println!(
        "  Gateway: {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!();

    let openai = &config.providers.openai;
    println!("{}", style("Provider:").bold());
    let key_status = if openai.api_key().is_some() {
        style("configured").green()
    } else {
        style("not configured").red()
    };
    println!("  openai: {}", key_status);
    println!(
        "  api base: {}",
        openai
            .api_base()
            .unwrap_or_else(|| secretary_providers::openai::DEFAULT_API_BASE.to_string())
    );
}
