//! Moe Serifu Agent CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use msa_core::Status;
use msa_runtime::{HostBuilder, Services, ShutdownSignal, SignalHandler, StopReason};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "msa")]
#[command(about = "Moe Serifu Agent", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent and talk to it on stdin
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "msa.yaml")]
        config: PathBuf,

        /// Extra plugin library to load (repeatable)
        #[arg(short, long = "plugin")]
        plugins: Vec<PathBuf>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "info", env = "MSA_LOG_LEVEL")]
        log_level: String,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "msa.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            plugins,
            log_level,
        } => {
            init_tracing(&log_level)?;
            let status = run(config, plugins).await?;
            std::process::exit(status.code());
        }

        Commands::Validate { config } => {
            init_tracing("info")?;

            tracing::info!("Validating configuration: {}", config.display());

            match msa_config::load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    for name in cfg.section_names() {
                        tracing::info!("  [{}] {} key(s)", name, cfg.section(name).len());
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(e.status().code());
                }
            }
        }

        Commands::Version => {
            println!("Moe Serifu Agent");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Plugin API: {}", msa_plugin_api::API_VERSION);
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

async fn run(config_path: PathBuf, plugins: Vec<PathBuf>) -> Result<Status> {
    tracing::info!("Config file: {}", config_path.display());

    let config = match msa_config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Could not load configuration: {}", e);
            return Ok(e.status());
        }
    };

    let shutdown = ShutdownSignal::new();
    tokio::spawn(SignalHandler::new(shutdown.clone()).run());

    let builder = plugins.into_iter().fold(
        HostBuilder::new()
            .config(config)
            .shutdown_signal(shutdown.clone()),
        |builder, path| builder.plugin_path(path),
    );
    let mut host = match builder.start() {
        Ok(host) => host,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            return Ok(e.status());
        }
    };

    let services = Arc::clone(host.services());
    let mut lines = spawn_stdin_reader();
    prompt(&services);

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::debug!("End of input");
                    break;
                };
                // handlers may block on suspended work
                let submitter = Arc::clone(&services);
                let submitted =
                    tokio::task::spawn_blocking(move || submitter.submit_input(&line)).await?;
                if let Err(e) = submitted {
                    tracing::error!("Input was not handled: {}", e);
                }
                if shutdown.is_triggered() {
                    break;
                }
                prompt(&services);
            }
        }
    }
    drop(services);

    let status = match host.stop(StopReason::Normal) {
        Ok(()) => Status::Success,
        Err(e) => {
            tracing::error!("Shutdown failed: {}", e);
            e.status()
        }
    };

    if let Err(refused) = host.dispose() {
        tracing::error!("{}", refused);
        return Ok(refused.error.status());
    }

    Ok(status)
}

fn prompt(services: &Services) {
    if let Err(e) = services.prompt() {
        tracing::debug!("No prompt: {}", e);
    }
}

/// Read stdin on its own thread; the channel closes at end of input
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    // stdout belongs to the agent
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(filter.into()))
        .init();

    Ok(())
}
