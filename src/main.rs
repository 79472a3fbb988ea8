//! Smart meter data relay.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                 ┌──────────────┐   GET /api/get_smart_meter_data   ┌──────────────┐
//!     ──────────────────────▶│    relay     │──────────────────────────────────▶│    origin    │
//!  GET /mcp/meter_data/{id}  │   (:5002)    │                                   │   (:5001)    │
//!     ◀──────────────────────│  streamed    │◀──────────────────────────────────│  CSV file    │
//!        chunked body        └──────────────┘        body streamed from disk    └──────────────┘
//! ```
//!
//! `meter-relay origin`, `meter-relay relay` or `meter-relay all` selects which
//! services this process runs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use meter_relay::config::{load_config, RelayConfig};
use meter_relay::lifecycle::{wait_for_termination, Shutdown};
use meter_relay::observability::{init_logging, metrics};
use meter_relay::{OriginServer, RelayServer};

#[derive(Parser)]
#[command(name = "meter-relay")]
#[command(about = "Serve a smart meter CSV and relay it as a stream", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the origin file server
    Origin,
    /// Run the relay service
    Relay,
    /// Run both services in one process
    All,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!(
        config = ?cli.config,
        origin_address = %config.origin.bind_address,
        relay_address = %config.relay.bind_address,
        "meter-relay v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let request_timeout = std::time::Duration::from_secs(config.timeouts.request_secs);
    let mut servers = JoinSet::new();

    if matches!(cli.command, Command::Origin | Command::All) {
        let server = OriginServer::new(&config.origin, request_timeout)?;
        let listener = TcpListener::bind(&config.origin.bind_address).await?;
        servers.spawn(server.run(listener, shutdown.subscribe("origin")));
    }

    if matches!(cli.command, Command::Relay | Command::All) {
        let server = RelayServer::new(&config.relay, &config.timeouts)?;
        let listener = TcpListener::bind(&config.relay.bind_address).await?;
        servers.spawn(server.run(listener, shutdown.subscribe("relay")));
    }

    tokio::select! {
        _ = wait_for_termination() => {
            shutdown.trigger();
        }
        Some(result) = servers.join_next() => {
            tracing::error!(result = ?result, "Server exited unexpectedly");
            shutdown.trigger();
        }
    }

    while let Some(result) = servers.join_next().await {
        if let Ok(Err(e)) = result {
            tracing::error!(error = %e, "Server error during shutdown");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
