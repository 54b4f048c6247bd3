//! # Block Store (qx-01)
//!
//! Read-only access to the append-only ledger written by the external
//! ingester.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Error taxonomy and the key-value record layout
//! - `ports/` - `BlockStore` (inbound API) and `KeyValueStore` (outbound SPI)
//! - `adapters/` - In-memory store, key-value store, retry decorator
//!
//! ## Failure Model
//!
//! | Outcome | Representation | Retried |
//! |---------|----------------|---------|
//! | No such record | `Ok(None)` / empty | never |
//! | Backend unreachable | `StoreError::Unavailable` | yes |
//! | Call deadline exceeded | `StoreError::Timeout` | yes |
//! | Dangling index / bad record | `StoreError::Corrupt` / `Codec` | no |
//!
//! ## Usage
//!
//! ```ignore
//! use qx_01_block_store::{InMemoryBlockStore, RetryingBlockStore, RetryPolicy, BlockStore};
//!
//! let store = RetryingBlockStore::new(InMemoryBlockStore::new(), RetryPolicy::default());
//! let tip = store.get_latest_by_height().await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::kv::KvBlockStore;
pub use adapters::kv_memory::InMemoryKVStore;
pub use adapters::memory::InMemoryBlockStore;
pub use adapters::retry::{RetryPolicy, RetryingBlockStore};
pub use domain::errors::{KVStoreError, StoreError, StoreResult};
pub use domain::keys::KeyPrefix;
pub use ports::inbound::BlockStore;
pub use ports::outbound::{KeyValueStore, ScanDirection, ScanResult, Visitor};
