//! Fixtures and fault-injecting stores shared by the explorer test suites.
//!
//! The fixture chain holds heights 100..=105 with hashes `h100`..`h105`.
//! Block 101 also owns a kernel whose id is the string `"103"`, so a search
//! for `"103"` must prefer the height interpretation.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use shared_types::{
    Block, BlockHeader, BlockId, CoinAmount, EntityKind, Input, Kernel, Output, OutputType,
    RelatedCount, TimeWindow,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::memory::InMemoryBlockStore;
use crate::domain::errors::{StoreError, StoreResult};
use crate::ports::inbound::BlockStore;

/// Subsidy of every fixture block: 60 coins.
pub const FIXTURE_SUBSIDY: u64 = 6_000_000_000;

/// Heights of the fixture chain.
pub const FIXTURE_HEIGHTS: std::ops::RangeInclusive<u64> = 100..=105;

/// The heaviest fixture block by distinct outputs + inputs + kernels.
pub const FIXTURE_HEAVIEST_HEIGHT: u64 = 102;

/// Creation time of the fixture block at height 100.
pub fn fixture_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// Fixture blocks are one hour apart.
pub fn fixture_time(height: u64) -> DateTime<Utc> {
    fixture_epoch() + ChronoDuration::hours(height as i64 - 100)
}

/// A block with `txs` spends: `txs` inputs, `txs + 1` outputs and
/// `txs + 1` kernels (one coinbase).
pub fn make_block(height: u64, txs: u64) -> Block {
    let id = BlockId(height + 1);
    let row = |i: u64| height * 100 + i;

    let inputs = (0..txs)
        .map(|i| Input {
            id: row(i),
            commitment: format!("in-{height}-{i}"),
            block_id: id,
        })
        .collect();

    let mut outputs = vec![Output {
        id: row(0),
        commitment: format!("cb-{height}"),
        output_type: OutputType::Coinbase,
        block_id: id,
    }];
    outputs.extend((1..=txs).map(|i| Output {
        id: row(i),
        commitment: format!("out-{height}-{i}"),
        output_type: OutputType::Transaction,
        block_id: id,
    }));

    let mut kernels = vec![Kernel {
        id: row(0),
        kernel_id: format!("k{height}"),
        block_id: id,
        fee: 0,
        excess: format!("{height:064x}"),
    }];
    kernels.extend((1..=txs).map(|i| Kernel {
        id: row(i),
        kernel_id: format!("k{height}-{i}"),
        block_id: id,
        fee: 1_000_000,
        excess: format!("{:064x}", row(i)),
    }));

    Block {
        id,
        height,
        hash: format!("h{height}"),
        subsidy: FIXTURE_SUBSIDY,
        created_at: fixture_time(height),
        inputs,
        outputs,
        kernels,
    }
}

/// The six fixture blocks in ascending height order.
pub fn fixture_blocks() -> Vec<Block> {
    let txs = [0, 1, 3, 1, 2, 0];
    let mut blocks: Vec<Block> = FIXTURE_HEIGHTS
        .zip(txs)
        .map(|(height, txs)| make_block(height, txs))
        .collect();

    let owner = &mut blocks[1];
    owner.kernels.push(Kernel {
        id: owner.height * 100 + 50,
        kernel_id: "103".to_string(),
        block_id: owner.id,
        fee: 0,
        excess: "ab".repeat(32),
    });
    blocks
}

pub fn fixture_store() -> InMemoryBlockStore {
    InMemoryBlockStore::with_blocks(fixture_blocks()).unwrap()
}

/// A kernel whose `block_id` resolves to no block.
pub fn orphan_kernel(kernel_id: &str) -> Kernel {
    Kernel {
        id: 999_999,
        kernel_id: kernel_id.to_string(),
        block_id: BlockId(9_999),
        fee: 0,
        excess: "00".repeat(32),
    }
}

/// Call counts recorded by an `ObservedBlockStore`.
#[derive(Default)]
pub struct CallCounter {
    total: AtomicUsize,
    by_operation: Mutex<HashMap<&'static str, usize>>,
}

impl CallCounter {
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn count(&self, operation: &str) -> usize {
        self.by_operation
            .lock()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.total.store(0, Ordering::SeqCst);
        self.by_operation.lock().clear();
    }

    fn record(&self, operation: &'static str) {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.by_operation.lock().entry(operation).or_insert(0) += 1;
    }
}

/// Wraps a store, counting calls and optionally failing or stalling them.
pub struct ObservedBlockStore<S> {
    inner: S,
    calls: Arc<CallCounter>,
    failures_left: AtomicUsize,
    failure: Mutex<StoreError>,
    latency: Option<Duration>,
}

impl<S: BlockStore> ObservedBlockStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(CallCounter::default()),
            failures_left: AtomicUsize::new(0),
            failure: Mutex::new(StoreError::Unavailable("injected".into())),
            latency: None,
        }
    }

    /// Fail the next `count` calls with `error`.
    pub fn failing(self, count: usize, error: StoreError) -> Self {
        self.fail_next(count, error);
        self
    }

    /// Sleep before every call.
    pub fn with_latency(self, latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..self
        }
    }

    pub fn calls(&self) -> Arc<CallCounter> {
        Arc::clone(&self.calls)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail the next `count` calls on a store that is already shared.
    pub fn fail_next(&self, count: usize, error: StoreError) {
        *self.failure.lock() = error;
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.failures_left.store(0, Ordering::SeqCst);
    }

    async fn enter(&self, operation: &'static str) -> StoreResult<()> {
        self.calls.record(operation);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if injected {
            Err(self.failure.lock().clone())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for ObservedBlockStore<S> {
    async fn get_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        self.enter("get_by_height").await?;
        self.inner.get_by_height(height).await
    }

    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Block>> {
        self.enter("get_by_hash").await?;
        self.inner.get_by_hash(hash).await
    }

    async fn get_by_id(&self, id: BlockId) -> StoreResult<Option<Block>> {
        self.enter("get_by_id").await?;
        self.inner.get_by_id(id).await
    }

    async fn get_latest_by_height(&self) -> StoreResult<Option<Block>> {
        self.enter("get_latest_by_height").await?;
        self.inner.get_latest_by_height().await
    }

    async fn get_kernel_by_id(&self, kernel_id: &str) -> StoreResult<Option<Kernel>> {
        self.enter("get_kernel_by_id").await?;
        self.inner.get_kernel_by_id(kernel_id).await
    }

    async fn sum_subsidy_all(&self) -> StoreResult<CoinAmount> {
        self.enter("sum_subsidy_all").await?;
        self.inner.sum_subsidy_all().await
    }

    async fn headers_in_range(&self, from: u64, to: u64) -> StoreResult<Vec<BlockHeader>> {
        self.enter("headers_in_range").await?;
        self.inner.headers_in_range(from, to).await
    }

    async fn count_related_in_window(
        &self,
        kinds: &[EntityKind],
        window: Option<TimeWindow>,
    ) -> StoreResult<Vec<RelatedCount>> {
        self.enter("count_related_in_window").await?;
        self.inner.count_related_in_window(kinds, window).await
    }

    async fn list_blocks(&self, offset: u64, limit: u64) -> StoreResult<Vec<Block>> {
        self.enter("list_blocks").await?;
        self.inner.list_blocks(offset, limit).await
    }
}
