//! # Outbound Port
//!
//! Byte-level key-value cache the derived layer writes through.
//!
//! Production deployments can back this with an external cache server;
//! `InMemoryCacheClient` serves a single process.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::CacheResult;

/// A shared key-value cache with full-value overwrite semantics.
///
/// Implementations must be safe under concurrent `get`/`set` on the same key.
/// After `close`, every call fails with `CacheError::Closed`.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` with no expiry, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()>;

    /// Store `value`, readable for `ttl` from now.
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Release the client. Idempotent.
    async fn close(&self) -> CacheResult<()>;
}
