//! # Derived-Value Cache Service
//!
//! Typed read-through layer over a `CacheClient`.
//!
//! ```text
//! get_or_compute(key) ──get──→ CacheClient
//!        │ hit: decode → return
//!        │ miss / decode failure / backend failure
//!        ↓
//!   compute() ──Ok──→ set[_with_ttl] ──→ return value
//!        └──Err──→ return error, nothing written
//! ```
//!
//! Cache failures never fail a read. They are logged, counted and served as
//! misses.

use explorer_telemetry::{CACHE_ERRORS, CACHE_LOOKUPS, CACHE_WRITES};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::errors::CacheResult;
use crate::domain::keys::DerivedKey;
use crate::domain::policy::CachePolicy;
use crate::ports::outbound::CacheClient;

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
}

#[derive(Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

/// Typed, read-through cache of the chain-wide derived values.
pub struct DerivedValueCache {
    client: Arc<dyn CacheClient>,
    policy: CachePolicy,
    stats: CacheStats,
}

impl DerivedValueCache {
    pub fn new(client: Arc<dyn CacheClient>, policy: CachePolicy) -> Self {
        Self {
            client,
            policy,
            stats: CacheStats::default(),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Return the cached value for `key`, or run `compute` and cache its
    /// result.
    ///
    /// The cache is written only after `compute` succeeds, so a failed or
    /// cancelled computation leaves the previous state untouched.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: DerivedKey, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.put(key, &value).await;
        Ok(value)
    }

    /// Read a cached value without computing on miss.
    pub async fn get<T: DeserializeOwned>(&self, key: DerivedKey) -> Option<T> {
        let bytes = match self.client.get(key.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.record_miss(key);
                return None;
            }
            Err(err) => {
                self.record_error(key, "get", &err.to_string());
                self.record_miss(key);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                CACHE_LOOKUPS
                    .with_label_values(&[key.as_str(), "hit"])
                    .inc();
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(err) => {
                self.record_error(key, "decode", &err.to_string());
                self.record_miss(key);
                None
            }
        }
    }

    /// Overwrite `key` with `value`, applying the policy TTL.
    ///
    /// Failures are logged and swallowed.
    pub async fn put<T: Serialize>(&self, key: DerivedKey, value: &T) {
        if let Err(err) = self.try_put(key, value).await {
            self.record_error(key, "set", &err.to_string());
            return;
        }
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        CACHE_WRITES.with_label_values(&[key.as_str()]).inc();
    }

    async fn try_put<T: Serialize>(&self, key: DerivedKey, value: &T) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        match self.policy.ttl_for(key) {
            Some(ttl) => self.client.set_with_ttl(key.as_str(), bytes, ttl).await,
            None => self.client.set(key.as_str(), bytes).await,
        }
    }

    /// Evict one derived value; the next read recomputes it.
    pub async fn invalidate(&self, key: DerivedKey) {
        match self.client.delete(key.as_str()).await {
            Ok(()) => debug!(key = %key, "Invalidated derived value"),
            Err(err) => self.record_error(key, "delete", &err.to_string()),
        }
    }

    /// Hook for the ingester: a block was appended at the tip.
    ///
    /// Every derived value is a function of the chain tip, so all of them
    /// are evicted.
    pub async fn on_block_ingested(&self) {
        for key in DerivedKey::ALL {
            self.invalidate(key).await;
        }
        info!("Derived values invalidated after block ingestion");
    }

    /// Close the underlying client at shutdown.
    pub async fn close(&self) -> CacheResult<()> {
        self.client.close().await
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            writes: self.stats.writes.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
        }
    }

    fn record_miss(&self, key: DerivedKey) {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        CACHE_LOOKUPS
            .with_label_values(&[key.as_str(), "miss"])
            .inc();
        debug!(key = %key, "Cache miss");
    }

    fn record_error(&self, key: DerivedKey, operation: &'static str, error: &str) {
        self.stats.errors.fetch_add(1, Ordering::Relaxed);
        CACHE_ERRORS
            .with_label_values(&[key.as_str(), operation])
            .inc();
        warn!(key = %key, operation, error, "Cache failure, serving from block store");
    }
}
