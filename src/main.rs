//! QQL Studio - HTTP front end for the qql-cli renderer
//!
//! Serves the studio API and web UI, renders seeds through the external
//! `qql-cli` executable and keeps the results in an output directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qql_studio::{config::QqlConfig, server::Server};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "qql-studio")]
#[command(version)]
#[command(about = "HTTP front end for the qql-cli renderer")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "QQL_STUDIO_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,

        /// Path to the qql-cli executable
        #[arg(long)]
        cli: Option<PathBuf>,

        /// Directory renders are written to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory holding the web UI
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Run diagnostics
    Doctor,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            cli: cli_path,
            output_dir,
            static_dir,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(path) = cli_path {
                config.cli.path = path;
            }
            if let Some(dir) = output_dir {
                config.storage.output_dir = dir;
            }
            if let Some(dir) = static_dir {
                config.storage.static_dir = Some(dir);
            }
            run_server(resolve(config)?).await?;
        }
        Commands::Doctor => {
            run_doctor(resolve(config)?).await;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("qql_studio={},tower_http={}", log_level, log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Explicit path, else the default location when it exists, else defaults
fn load_config(path: Option<&Path>) -> Result<QqlConfig> {
    if let Some(path) = path {
        return QqlConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match QqlConfig::default_path().filter(|p| p.exists()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Using default config file");
            QqlConfig::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => Ok(QqlConfig::default()),
    }
}

fn resolve(config: QqlConfig) -> Result<QqlConfig> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = config.resolve_paths(&cwd);
    config.validate()?;
    Ok(config)
}

async fn run_server(config: QqlConfig) -> Result<()> {
    tracing::info!(
        cli = %config.cli.path.display(),
        output_dir = %config.storage.output_dir.display(),
        "Starting QQL Studio"
    );

    let server = Server::new(config)?;
    server.prepare().await;
    let listener = server.bind().await.context("Failed to bind listen address")?;

    tracing::info!("QQL Studio is running. Press Ctrl+C to stop.");

    server
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        })
        .await?;

    Ok(())
}

async fn run_doctor(config: QqlConfig) {
    println!("QQL Studio Doctor");
    println!();

    println!("Checking qql-cli...");
    if config.cli.path.is_file() {
        println!("  ✓ Found: {}", config.cli.path.display());
        let runner = qql_studio::process::ProcessRunner::new();
        let working_dir = config.cli.working_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let result = runner
            .execute(
                &config.cli.path,
                &["--version".to_string()],
                &working_dir,
                config.cli.status_timeout(),
            )
            .await;
        if result.succeeded {
            println!("  ✓ Version: {}", result.stdout);
        } else {
            println!("  ✗ --version failed: {}", result.stderr);
        }
    } else {
        println!("  ✗ Not found: {}", config.cli.path.display());
    }

    println!();
    println!("Checking output directory...");
    match tokio::fs::create_dir_all(&config.storage.output_dir).await {
        Ok(()) => println!("  ✓ Writable: {}", config.storage.output_dir.display()),
        Err(e) => println!(
            "  ✗ Cannot create {}: {}",
            config.storage.output_dir.display(),
            e
        ),
    }

    println!();
    println!("Checking configuration...");
    match QqlConfig::default_path() {
        Some(path) if path.exists() => {
            println!("  ✓ Configuration file found: {}", path.display())
        }
        _ => println!("  ℹ No configuration file found (using defaults)"),
    }

    println!();
    println!("Doctor check complete!");
}

fn show_config(config: Option<&QqlConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    println!("{}", config.to_toml()?);
    Ok(())
}
