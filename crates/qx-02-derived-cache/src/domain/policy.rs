//! Per-key expiry.

use std::collections::HashMap;
use std::time::Duration;

use super::keys::DerivedKey;

/// Time-to-live per derived key.
///
/// Keys without an entry never expire; they are only replaced after an
/// explicit invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachePolicy {
    ttls: HashMap<DerivedKey, Duration>,
}

impl CachePolicy {
    /// No key expires.
    pub fn never_expire() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, key: DerivedKey, ttl: Duration) -> Self {
        self.ttls.insert(key, ttl);
        self
    }

    pub fn ttl_for(&self, key: DerivedKey) -> Option<Duration> {
        self.ttls.get(&key).copied()
    }
}
