//! # Derived-Value Cache (qx-02)
//!
//! Keeps the chain-wide aggregates that are expensive to compute from the
//! block store: latest height, latest block, total emission and the charting
//! window.
//!
//! ## Guarantees
//!
//! | Property | How |
//! |----------|-----|
//! | Never the source of truth | every entry is recomputed on miss |
//! | No partial values | written only after a successful computation |
//! | Reads never fail on cache trouble | backend/codec failures are misses |
//! | Bounded staleness (opt-in) | per-key TTL via `CachePolicy` |
//! | Explicit freshness | `invalidate` / `on_block_ingested` hooks |
//!
//! The client handle is created at process start, injected as
//! `Arc<dyn CacheClient>`, and closed at shutdown.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::memory::InMemoryCacheClient;
pub use domain::errors::{CacheError, CacheResult};
pub use domain::keys::DerivedKey;
pub use domain::policy::CachePolicy;
pub use ports::outbound::CacheClient;
pub use service::{CacheStatsSnapshot, DerivedValueCache};
