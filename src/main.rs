//! Front API gateway.
//!
//! An HTTP gateway in front of the video, user and scheduler services.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────────────┐
//!                        │                    FRONT GATEWAY                      │
//!                        │                                                       │
//!   Client Request       │  ┌─────────┐   ┌──────────┐   ┌───────────────┐      │
//!   ─────────────────────┼─▶│  http   │──▶│  params  │──▶│ read-through  │──────┼──▶ video / user /
//!                        │  │ server  │   │ + session│   │    cache      │      │    scheduler
//!                        │  └────┬────┘   └──────────┘   └───────┬───────┘      │    services
//!                        │       │                               │ store        │
//!                        │       │ multipart                     ▼              │
//!                        │       ▼                        ┌─────────────┐       │
//!                        │  ┌──────────┐  frames          │memory/redis │       │
//!                        │  │  upload  │──────────────────┼─────────────┼───────┼──▶ UploadVideo
//!                        │  │  bridge  │                  └─────────────┘       │
//!                        │  └──────────┘                                        │
//!                        │  ┌──────────────────────────────────────────────┐    │
//!                        │  │ background queue (views, engagement feedback)│────┼──▶ video / recommender
//!                        │  └──────────────────────────────────────────────┘    │
//!                        │  config · observability · lifecycle                  │
//!                        └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use front_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig};
use front_gateway::lifecycle::{wait_for_signal, Shutdown};
use front_gateway::observability::{logging, metrics};
use front_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "front-gateway")]
#[command(about = "HTTP gateway in front of the video, user and scheduler services", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let config = GatewayConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "front-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        cache_enabled = config.cache.enabled,
        chunk_size = config.upload.chunk_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::from_config(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
