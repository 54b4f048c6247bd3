//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the key-value block store requires the host to provide.

use std::ops::ControlFlow;

use crate::domain::errors::KVStoreError;

/// Result of a scan: ordered `(key, value)` pairs.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Order in which `visit_prefix` walks keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    Forward,
    Reverse,
}

/// Callback for `visit_prefix`; `Break` stops the walk.
pub type Visitor<'a> = dyn FnMut(&[u8], &[u8]) -> ControlFlow<()> + 'a;

/// Read-only ordered key-value database.
///
/// The explorer never writes; the external ingester owns the database and
/// this side opens it read-only. Calls block the calling thread.
///
/// Production: `RocksDbStore` (explorer-runtime/src/adapters/rocksdb.rs)
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Every pair whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;

    /// Every pair with `start <= key < end`, in key order.
    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanResult, KVStoreError>;

    /// The pair with the greatest key under `prefix`.
    fn last_in_prefix(&self, prefix: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, KVStoreError>;

    /// Walk the pairs under `prefix` one at a time until `visit` breaks.
    ///
    /// The default collects a `prefix_scan` first; backends with cursors
    /// override it to stream.
    fn visit_prefix(
        &self,
        prefix: &[u8],
        direction: ScanDirection,
        visit: &mut Visitor<'_>,
    ) -> Result<(), KVStoreError> {
        let mut entries = self.prefix_scan(prefix)?;
        if direction == ScanDirection::Reverse {
            entries.reverse();
        }
        for (key, value) in &entries {
            if visit(key.as_slice(), value.as_slice()).is_break() {
                break;
            }
        }
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        (**self).get(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        (**self).prefix_scan(prefix)
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanResult, KVStoreError> {
        (**self).range_scan(start, end)
    }

    fn last_in_prefix(&self, prefix: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        (**self).last_in_prefix(prefix)
    }

    fn visit_prefix(
        &self,
        prefix: &[u8],
        direction: ScanDirection,
        visit: &mut Visitor<'_>,
    ) -> Result<(), KVStoreError> {
        (**self).visit_prefix(prefix, direction, visit)
    }
}
