//! Market data gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                     GATEWAY                        │
//!                     │                                                    │
//!   execute(category) │  ┌──────────┐   ┌──────────────┐   ┌───────────┐  │
//!   ──────────────────┼─▶│ fallback │──▶│   routing    │──▶│  health   │  │
//!                     │  │orchestr. │   │ (rank once)  │   │  scores   │  │
//!                     │  └────┬─────┘   └──────────────┘   └───────────┘  │
//!                     │       │ per candidate                              │
//!                     │       ▼                                            │
//!                     │  ┌──────────┐   ┌──────────────┐                   │
//!   payload / error   │  │ breaker  │──▶│ source call  │───────────────────┼──▶ provider
//!   ◀─────────────────┼──│ permit   │◀──│ under timeout│◀──────────────────┼───
//!                     │  └──────────┘   └──────────────┘                   │
//!                     │                                                    │
//!                     │  config (hot reload) · admin API · metrics · logs   │
//!                     └───────────────────────────────────────────────────┘
//! ```
//!
//! The binary hosts the shared state, the admin API and config hot reload.
//! Provider adapters live in the embedding application and reach the
//! gateway through the library.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use market_data_gateway::admin::{setup_admin_router, AdminState};
use market_data_gateway::config::{load_config, watcher::ConfigWatcher};
use market_data_gateway::lifecycle::{wait_for_ctrl_c, Shutdown};
use market_data_gateway::observability::{logging, metrics};
use market_data_gateway::Gateway;

#[derive(Parser)]
#[command(name = "market-data-gateway")]
#[command(about = "Multi-source market data gateway with circuit breakers and health-ranked fallback")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        sources = config.data_sources.len(),
        categories = config.data_categories.len(),
        "market-data-gateway starting"
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

    let gateway = Arc::new(Gateway::from_config(&config));
    let shutdown = Shutdown::new();

    // The notify handle must outlive the reload loop.
    let (watcher, mut updates) = ConfigWatcher::new(&args.config);
    let _watch_guard = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
            None
        }
    };

    let admin_state = AdminState::new(Arc::clone(&gateway), config.admin.api_key.as_str());

    let reload_admin = admin_state.clone();
    let mut reload_stop = shutdown.subscribe();
    let reloader = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(next) = updates.recv() => {
                    reload_admin.gateway.apply_config(&next);
                    reload_admin.set_api_key(next.admin.api_key.as_str());
                }
                _ = reload_stop.recv() => break,
                else => break,
            }
        }
    });

    let server = if config.admin.enabled {
        if config.admin.api_key == "CHANGE_ME_IN_PRODUCTION" {
            tracing::warn!("Admin API is using the default api_key");
        }
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let app = setup_admin_router(admin_state);
        let stop = shutdown.wait();
        Some(tokio::spawn(async move {
            axum::serve(listener, app).with_graceful_shutdown(stop).await
        }))
    } else {
        None
    };

    wait_for_ctrl_c().await;
    shutdown.trigger();

    if let Some(server) = server {
        if let Err(e) = server.await? {
            tracing::error!(error = %e, "Admin API stopped with error");
        }
    }
    reloader.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
