//! # Ledger Explorer
//!
//! Read-only explorer API over the ledger written by the ingester.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics
//! 2. Load configuration (file, then environment)
//! 3. Open the block store behind the retry decorator
//! 4. Build the query service and its derived-value cache
//! 5. Start the chain tip watcher
//! 6. Serve HTTP until Ctrl+C, then close the cache

use anyhow::{Context, Result};
use explorer_runtime::{Explorer, RuntimeConfig};
use explorer_telemetry::{init_telemetry, TelemetryConfig};
use tokio::sync::oneshot;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let config = RuntimeConfig::from_env().context("failed to load configuration")?;
    info!(backend = ?config.backend, "Configuration loaded");

    let explorer = Explorer::build(&config)?;

    let (stop_watcher, watcher_stopped) = oneshot::channel::<()>();
    let watcher = config.tip_poll_interval.map(|interval| {
        tokio::spawn(explorer.tip_watcher(interval).run(async {
            let _ = watcher_stopped.await;
        }))
    });

    let addr = config.explorer.http_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "Explorer API listening. Press Ctrl+C to stop.");

    axum::serve(listener, explorer.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    // Graceful shutdown
    let _ = stop_watcher.send(());
    if let Some(handle) = watcher {
        if let Err(e) = handle.await {
            warn!(error = %e, "Chain tip watcher task failed");
        }
    }
    explorer.service.shutdown().await;
    info!("Explorer stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
