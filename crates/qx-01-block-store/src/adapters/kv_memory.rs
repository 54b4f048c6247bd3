use parking_lot::RwLock;
use shared_types::Block;
use std::collections::BTreeMap;

use crate::domain::errors::{KVStoreError, StoreResult};
use crate::domain::keys::block_entries;
use crate::ports::outbound::{KeyValueStore, ScanResult};

/// Ordered in-memory key-value store for unit tests.
///
/// Production uses `RocksDbStore` opened as a read-only secondary.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &[u8], value: &[u8]) {
        self.data.write().insert(key.to_vec(), value.to_vec());
    }

    pub fn delete(&self, key: &[u8]) {
        self.data.write().remove(key);
    }

    /// Write every record of `block` the way the ingester lays them out.
    pub fn insert_block(&self, block: &Block) -> StoreResult<()> {
        let entries = block_entries(block)?;
        let mut data = self.data.write();
        for (key, value) in entries {
            data.insert(key, value);
        }
        Ok(())
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(self
            .data
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanResult, KVStoreError> {
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(self
            .data
            .read()
            .range(start.to_vec()..end.to_vec())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn last_in_prefix(&self, prefix: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        Ok(self
            .data
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .last()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}
