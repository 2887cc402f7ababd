//! Site guard server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────────┐
//!                    │                      SITE GUARD                        │
//!                    │                                                        │
//!   Browser request  │  ┌──────────┐   ┌───────────┐   ┌──────────────────┐  │
//!   ─────────────────┼─▶│   http   │──▶│ security  │──▶│ session / content│──┼──▶ WordPress
//!                    │  │  server  │   │ rate limit│   │     handlers     │  │    REST API
//!                    │  └──────────┘   │ csrf      │   └──────────────────┘  │
//!                    │                 │ sanitize  │                         │
//!                    │                 └───────────┘                         │
//!                    │  ┌─────────────────────────────────────────────────┐  │
//!                    │  │             Cross-Cutting Concerns              │  │
//!                    │  │  config · error policy · secure logging ·       │  │
//!                    │  │  metrics · lifecycle                            │  │
//!                    │  └─────────────────────────────────────────────────┘  │
//!                    └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use site_guard::config::{load_config, soft_warnings};
use site_guard::lifecycle::{spawn_signal_listener, Shutdown};
use site_guard::observability::{logging, metrics, SecureLogger};
use site_guard::{AppState, GuardServer};

#[derive(Parser)]
#[command(name = "site-guard")]
#[command(about = "Security and session layer for a WordPress-backed site", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "site-guard starting"
    );
    for warning in soft_warnings(&config) {
        tracing::warn!("{warning}");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit = config.rate_limit.limit,
        rate_window_ms = config.rate_limit.window_ms,
        "Configuration loaded"
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let logger = SecureLogger::tracing(!config.is_production());
    let state = AppState::new(config, logger)?;
    let server = GuardServer::new(state);

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
