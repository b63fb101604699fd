//! iowait plugin - exposes CPU IO wait to the host monitoring tool.

use anyhow::Result;
use clap::Parser;
use iowait_plugin::{app::App, cli::Cli, config::Config, shutdown::spawn_interrupt_handler};
use std::io::IsTerminal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    if let Err(err) = run(config).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    info!("Starting...");

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Socket Path: {}", config.socket_path.display());
    info!("Host ID: {}", config.host_id);
    info!(
        "Sample Command: {} {}",
        config.source.command,
        config.source.args.join(" ")
    );
    match config.source.timeout_ms {
        Some(ms) => info!("Sample Timeout: {}ms", ms),
        None => info!("Sample Timeout: none"),
    }
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_interrupt_handler(config.socket_path.clone(), shutdown_tx)?;

    match App::builder(config).build(shutdown_rx).await? {
        Some(app) => app.run().await?,
        None => info!("Interrupted during startup."),
    }

    info!("Exiting.");
    Ok(())
}
