//! # RocksDB Storage Adapter
//!
//! Read-only `KeyValueStore` over the ingester's RocksDB, opened as a
//! secondary instance.
//!
//! ## Configuration
//!
//! - `primary_path`: the ingester's database directory
//! - `secondary_path`: private directory for the secondary's own logs
//! - block cache (64MB default) and bloom filters for point lookups

use qx_01_block_store::{KVStoreError, KeyValueStore, ScanDirection, ScanResult, Visitor};
use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::PathBuf;

use crate::watcher::Refresh;

/// RocksDB configuration for the secondary instance
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Directory of the primary (ingester) database
    pub primary_path: PathBuf,
    /// Directory where the secondary keeps its info logs
    pub secondary_path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
}

impl RocksDbConfig {
    pub fn new(primary_path: impl Into<PathBuf>, secondary_path: impl Into<PathBuf>) -> Self {
        Self {
            primary_path: primary_path.into(),
            secondary_path: secondary_path.into(),
            block_cache_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// RocksDB secondary instance implementing `KeyValueStore`
pub struct RocksDbStore {
    db: DB,
}

impl RocksDbStore {
    /// Open the primary database as a read-only secondary
    pub fn open_secondary(config: &RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        // secondary instances must keep every file open
        opts.set_max_open_files(-1);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open_as_secondary(&opts, &config.primary_path, &config.secondary_path)
            .map_err(|e| KVStoreError::IOError {
                message: format!("Failed to open RocksDB secondary: {}", e),
            })?;

        tracing::info!(
            primary = %config.primary_path.display(),
            secondary = %config.secondary_path.display(),
            "Opened RocksDB secondary instance"
        );
        Ok(Self { db })
    }

    /// Replay the primary's latest writes into this instance
    pub fn catch_up(&self) -> Result<(), KVStoreError> {
        self.db
            .try_catch_up_with_primary()
            .map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB catch-up failed: {}", e),
            })
    }

    fn scan<F>(&self, mode: IteratorMode<'_>, mut keep: F) -> Result<ScanResult, KVStoreError>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let mut results = Vec::new();
        for item in self.db.iterator(mode) {
            let (key, value) = item.map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB scan failed: {}", e),
            })?;
            if !keep(&key[..]) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}

/// Smallest key greater than every key starting with `prefix`.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last != u8::MAX {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| KVStoreError::IOError {
            message: format!("RocksDB get failed: {}", e),
        })
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.scan(IteratorMode::From(prefix, Direction::Forward), |key| {
            key.starts_with(prefix)
        })
    }

    fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.scan(IteratorMode::From(start, Direction::Forward), |key| key < end)
    }

    fn last_in_prefix(&self, prefix: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let upper = prefix_successor(prefix);
        let mode = match &upper {
            Some(upper) => IteratorMode::From(upper.as_slice(), Direction::Reverse),
            None => IteratorMode::End,
        };

        for item in self.db.iterator(mode) {
            let (key, value) = item.map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB reverse scan failed: {}", e),
            })?;
            if key.starts_with(prefix) {
                return Ok(Some((key.to_vec(), value.to_vec())));
            }
            if &key[..] < prefix {
                break;
            }
        }
        Ok(None)
    }

    fn visit_prefix(
        &self,
        prefix: &[u8],
        direction: ScanDirection,
        visit: &mut Visitor<'_>,
    ) -> Result<(), KVStoreError> {
        let upper = prefix_successor(prefix);
        let mode = match (direction, &upper) {
            (ScanDirection::Forward, _) => IteratorMode::From(prefix, Direction::Forward),
            (ScanDirection::Reverse, Some(upper)) => {
                IteratorMode::From(upper.as_slice(), Direction::Reverse)
            }
            (ScanDirection::Reverse, None) => IteratorMode::End,
        };

        for item in self.db.iterator(mode) {
            let (key, value) = item.map_err(|e| KVStoreError::IOError {
                message: format!("RocksDB scan failed: {}", e),
            })?;
            if !key.starts_with(prefix) {
                // reverse seeks land on the successor itself first
                if direction == ScanDirection::Reverse && &key[..] > prefix {
                    continue;
                }
                break;
            }
            if visit(&key[..], &value[..]).is_break() {
                break;
            }
        }
        Ok(())
    }
}

impl Refresh for RocksDbStore {
    fn refresh(&self) -> Result<(), KVStoreError> {
        self.catch_up()
    }
}
