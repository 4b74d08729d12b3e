use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use soundpost_server::ShutdownCoordinator;
use soundpost_store::Database;

/// Control plane for a networked audio playback station.
#[derive(Debug, Parser)]
#[command(name = "soundpost", version)]
struct Cli {
    /// Config file (defaults to ~/.soundpost/config.json).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = soundpost_server::config::load_config(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    soundpost_telemetry::init_logging(&config.logging).context("failed to initialize logging")?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting soundpost");

    let db = Database::open(&config.database_path).context("failed to open database")?;

    let coordinator = ShutdownCoordinator::new();
    let handle = soundpost_server::start(config, db, coordinator.token())
        .await
        .context("failed to start server")?;
    tracing::info!(addr = %handle.addr(), "soundpost ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("shutting down");
    coordinator
        .graceful_shutdown(vec![handle.into_task()], None)
        .await;
    Ok(())
}
