//! # Explorer Telemetry
//!
//! Observability for the ledger explorer.
//!
//! - **Logs**: `tracing` events rendered by `tracing-subscriber`, either as
//!   human-readable lines or JSON for log shippers.
//! - **Metrics**: Prometheus counters and histograms for cache efficiency,
//!   query outcomes and block store retries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use explorer_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EXPLORER_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `EXPLORER_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |
//! | `EXPLORER_SERVICE_NAME` | `ledger-explorer` | Service name attached to logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, CACHE_ERRORS, CACHE_LOOKUPS, CACHE_WRITES,
    LATEST_BLOCK_HEIGHT, QUERIES, QUERY_DURATION, STORE_RETRIES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize log subscriber: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
