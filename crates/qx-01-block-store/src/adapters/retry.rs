//! Bounded retry with exponential backoff around any `BlockStore`.
//!
//! Only transient failures (`Unavailable`, `Timeout`) are retried. Absence is
//! `Ok(None)` and is returned immediately.

use async_trait::async_trait;
use explorer_telemetry::STORE_RETRIES;
use shared_types::{
    Block, BlockHeader, BlockId, CoinAmount, EntityKind, Kernel, RelatedCount, TimeWindow,
};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::errors::{StoreError, StoreResult};
use crate::ports::inbound::BlockStore;

/// Retry schedule for store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (minimum 1).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
    /// Cap on a single backoff delay.
    pub max_delay: Duration,
    /// Deadline for one attempt. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
            call_timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no deadline.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            call_timeout: None,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// `BlockStore` decorator applying a `RetryPolicy`.
pub struct RetryingBlockStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: BlockStore> RetryingBlockStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = StoreResult<T>> + Send,
        T: Send,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match self.policy.call_timeout {
                Some(deadline) => tokio::time::timeout(deadline, call())
                    .await
                    .unwrap_or(Err(StoreError::Timeout { operation })),
                None => call().await,
            };

            match result {
                Err(err) if err.is_transient() && attempt < attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient block store failure, retrying"
                    );
                    STORE_RETRIES.with_label_values(&[operation]).inc();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for RetryingBlockStore<S> {
    async fn get_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        let inner = &self.inner;
        self.run("get_by_height", move || inner.get_by_height(height))
            .await
    }

    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Block>> {
        let inner = &self.inner;
        self.run("get_by_hash", move || inner.get_by_hash(hash)).await
    }

    async fn get_by_id(&self, id: BlockId) -> StoreResult<Option<Block>> {
        let inner = &self.inner;
        self.run("get_by_id", move || inner.get_by_id(id)).await
    }

    async fn get_latest_by_height(&self) -> StoreResult<Option<Block>> {
        let inner = &self.inner;
        self.run("get_latest_by_height", move || inner.get_latest_by_height())
            .await
    }

    async fn get_kernel_by_id(&self, kernel_id: &str) -> StoreResult<Option<Kernel>> {
        let inner = &self.inner;
        self.run("get_kernel_by_id", move || inner.get_kernel_by_id(kernel_id))
            .await
    }

    async fn sum_subsidy_all(&self) -> StoreResult<CoinAmount> {
        let inner = &self.inner;
        self.run("sum_subsidy_all", move || inner.sum_subsidy_all())
            .await
    }

    async fn headers_in_range(&self, from: u64, to: u64) -> StoreResult<Vec<BlockHeader>> {
        let inner = &self.inner;
        self.run("headers_in_range", move || inner.headers_in_range(from, to))
            .await
    }

    async fn count_related_in_window(
        &self,
        kinds: &[EntityKind],
        window: Option<TimeWindow>,
    ) -> StoreResult<Vec<RelatedCount>> {
        let inner = &self.inner;
        self.run("count_related_in_window", move || {
            inner.count_related_in_window(kinds, window)
        })
        .await
    }

    async fn list_blocks(&self, offset: u64, limit: u64) -> StoreResult<Vec<Block>> {
        let inner = &self.inner;
        self.run("list_blocks", move || inner.list_blocks(offset, limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixture_store, ObservedBlockStore};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            call_timeout: None,
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = fast_policy(5);
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
        assert_eq!(policy.delay_for(4), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_success() {
        let observed = ObservedBlockStore::new(fixture_store())
            .failing(2, StoreError::Unavailable("connection reset".into()));
        let calls = observed.calls();
        let store = RetryingBlockStore::new(observed, fast_policy(3));

        let block = store.get_by_hash("h101").await.unwrap().unwrap();
        assert_eq!(block.height, 101);
        assert_eq!(calls.total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let observed = ObservedBlockStore::new(fixture_store())
            .failing(10, StoreError::Unavailable("down".into()));
        let calls = observed.calls();
        let store = RetryingBlockStore::new(observed, fast_policy(3));

        let err = store.sum_subsidy_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(calls.total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_are_not_retried() {
        let observed = ObservedBlockStore::new(fixture_store())
            .failing(1, StoreError::Corrupt("dangling index".into()));
        let calls = observed.calls();
        let store = RetryingBlockStore::new(observed, fast_policy(3));

        assert!(store.get_by_height(100).await.is_err());
        assert_eq!(calls.total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absence_is_not_retried() {
        let observed = ObservedBlockStore::new(fixture_store());
        let calls = observed.calls();
        let store = RetryingBlockStore::new(observed, fast_policy(3));

        assert!(store.get_by_hash("zzz").await.unwrap().is_none());
        assert_eq!(calls.total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let observed =
            ObservedBlockStore::new(fixture_store()).with_latency(Duration::from_secs(60));
        let policy = RetryPolicy {
            call_timeout: Some(Duration::from_secs(1)),
            ..fast_policy(2)
        };
        let store = RetryingBlockStore::new(observed, policy);

        let err = store.get_latest_by_height().await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Timeout {
                operation: "get_latest_by_height"
            }
        );
    }
}
