use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use triage_core::{Analyzer, ModelRoster};
use triage_gateway::GatewayServer;

mod config;

use config::TriageConfig;

#[derive(Parser)]
#[command(name = "triage")]
#[command(version)]
#[command(about = "triage — classify email urgency with a roster of Gemini models")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Override the bind address from the config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Classify a single email and print the verdict as JSON
    Analyze {
        /// Email subject
        #[arg(short, long, default_value = "")]
        subject: String,

        /// Email body
        #[arg(short, long, default_value = "")]
        body: String,
    },

    /// Write the default config file
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config),
        Commands::Serve { bind } => cmd_serve(&cli.config, bind).await,
        Commands::Analyze { subject, body } => cmd_analyze(&cli.config, &subject, &body).await,
    }
}

fn build_analyzer(cfg: &TriageConfig) -> Result<Analyzer> {
    if !cfg.provider.has_credential() {
        warn!("No Gemini API key configured; every request will get the fallback verdict");
    }
    Analyzer::gemini(
        Some(&cfg.provider.api_key),
        &cfg.provider.base_url,
        ModelRoster::default(),
        cfg.provider.attempt_timeout(),
    )
    .context("Failed to initialize Gemini provider")
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config::default_config_path();
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    tokio::fs::write(&config_path, config::DEFAULT_CONFIG).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    info!("Created default config at {}", config_path.display());

    println!("Edit {} and export GEMINI_API_KEY to enable model calls.", config_path.display());
    Ok(())
}

fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = TriageConfig::load(config_path)?;
    println!("{}", toml::to_string_pretty(&cfg.redacted())?);
    println!("# roster (attempt order):");
    for (idx, model) in ModelRoster::default().iter().enumerate() {
        println!("#   {}. {}", idx + 1, model);
    }
    Ok(())
}

async fn cmd_serve(config_path: &Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let mut cfg = TriageConfig::load(config_path)?;
    if let Some(bind) = bind {
        cfg.gateway.bind = bind;
    }
    let addr = cfg.gateway.bind_addr()?;
    let analyzer = Arc::new(build_analyzer(&cfg)?);

    info!(
        "Starting triage gateway with {} model(s), provider configured: {}",
        analyzer.roster().len(),
        analyzer.is_configured()
    );

    GatewayServer::new(addr, analyzer)
        .run_until(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
}

async fn cmd_analyze(config_path: &Option<PathBuf>, subject: &str, body: &str) -> Result<()> {
    let cfg = TriageConfig::load(config_path)?;
    let analyzer = build_analyzer(&cfg)?;

    let result = analyzer.analyze(subject, body).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
