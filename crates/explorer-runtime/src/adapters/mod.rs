//! # Production Storage Adapters
//!
//! Enable the `rocksdb` feature to read the ingester's RocksDB directly:
//!
//! ```toml
//! explorer-runtime = { path = "...", features = ["rocksdb"] }
//! ```
//!
//! The explorer opens the database as a secondary instance. It never writes,
//! and picks up the ingester's appends through `RocksDbStore::catch_up`.

#[cfg(feature = "rocksdb")]
pub mod rocksdb;

#[cfg(feature = "rocksdb")]
pub use self::rocksdb::{RocksDbConfig, RocksDbStore};
