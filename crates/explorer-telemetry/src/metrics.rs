//! Prometheus metrics for the ledger explorer.
//!
//! All metrics follow the naming convention: `explorer_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: cache lookups, cache writes, query outcomes, store retries
//! - **Gauge**: latest block height observed by a recomputation
//! - **Histogram**: per-operation query latency

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DERIVED-VALUE CACHE
    // =========================================================================

    /// Cache lookups by derived key and result (hit/miss)
    pub static ref CACHE_LOOKUPS: CounterVec = CounterVec::new(
        Opts::new("explorer_cache_lookups_total", "Derived-value cache lookups"),
        &["key", "result"]
    ).expect("metric creation failed");

    /// Cache writes by derived key
    pub static ref CACHE_WRITES: CounterVec = CounterVec::new(
        Opts::new("explorer_cache_writes_total", "Derived-value cache writes after recomputation"),
        &["key"]
    ).expect("metric creation failed");

    /// Cache backend or codec failures, served as misses
    pub static ref CACHE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("explorer_cache_errors_total", "Cache failures treated as misses"),
        &["key", "operation"]
    ).expect("metric creation failed");

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Query outcomes by operation
    pub static ref QUERIES: CounterVec = CounterVec::new(
        Opts::new("explorer_queries_total", "Explorer queries by operation and outcome"),
        &["operation", "outcome"]
    ).expect("metric creation failed");

    /// Query latency by operation
    pub static ref QUERY_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "explorer_query_duration_seconds",
            "Time spent answering explorer queries"
        ).buckets(exponential_buckets(0.0001, 2.0, 16).unwrap()),
        &["operation"]
    ).expect("metric creation failed");

    /// Latest block height seen by a recomputation
    pub static ref LATEST_BLOCK_HEIGHT: Gauge = Gauge::new(
        "explorer_latest_block_height",
        "Latest block height observed when recomputing chain-tip values"
    ).expect("metric creation failed");

    // =========================================================================
    // BLOCK STORE
    // =========================================================================

    /// Retries of transient block store failures
    pub static ref STORE_RETRIES: CounterVec = CounterVec::new(
        Opts::new("explorer_store_retries_total", "Block store calls retried after a transient failure"),
        &["operation"]
    ).expect("metric creation failed");
}

/// Handle to the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless; already registered collectors
/// are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_WRITES.clone()),
        Box::new(CACHE_ERRORS.clone()),
        Box::new(QUERIES.clone()),
        Box::new(QUERY_DURATION.clone()),
        Box::new(LATEST_BLOCK_HEIGHT.clone()),
        Box::new(STORE_RETRIES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
