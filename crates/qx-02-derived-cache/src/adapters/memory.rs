//! In-process cache client.
//!
//! Entries live in a `parking_lot::RwLock<HashMap>`. Expiry uses the tokio
//! clock so paused-time tests can advance it; expired entries read as absent
//! and are removed on the next access.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::errors::{CacheError, CacheResult};
use crate::ports::outbound::CacheClient;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// `CacheClient` backed by process memory.
#[derive(Default)]
pub struct InMemoryCacheClient {
    entries: RwLock<HashMap<String, Entry>>,
    closed: AtomicBool,
}

impl InMemoryCacheClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    fn insert(&self, key: &str, value: Vec<u8>, expires_at: Option<Instant>) -> CacheResult<()> {
        self.ensure_open()?;
        self.entries
            .write()
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}

#[async_trait]
impl CacheClient for InMemoryCacheClient {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        let now = Instant::now();

        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
            debug!(key, "Purged expired cache entry");
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()> {
        self.insert(key, value, None)
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.insert(key, value, Some(Instant::now() + ttl))
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.ensure_open()?;
        self.entries.write().remove(key);
        Ok(())
    }

    async fn close(&self) -> CacheResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.entries.write().clear();
            debug!("Cache client closed");
        }
        Ok(())
    }
}
