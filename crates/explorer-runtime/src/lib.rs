//! # Explorer Runtime Library
//!
//! Startup pieces of the `ledger-explorer` binary, exposed for testing.
//!
//! - `config` - runtime configuration from file and environment
//! - `seed` - JSON block fixtures for the in-memory backend
//! - `adapters` - production key-value backends
//! - `watcher` - chain tip polling that drives cache invalidation
//! - `wiring` - store, cache and service assembly

pub mod adapters;
pub mod config;
pub mod seed;
pub mod watcher;
pub mod wiring;

pub use config::{RuntimeConfig, StoreBackend};
pub use watcher::{Refresh, TipWatcher};
pub use wiring::Explorer;
