//! # Inbound Port
//!
//! The read-only block store API consumed by the query layer.
//!
//! Every call is async so a dropped request future abandons the in-flight
//! store call. Absence is `Ok(None)` (or an empty collection), never an error.

use async_trait::async_trait;
use shared_types::{
    Block, BlockHeader, BlockId, CoinAmount, EntityKind, Kernel, RelatedCount, TimeWindow,
};
use std::sync::Arc;

use crate::domain::errors::StoreResult;

/// Read access to the append-only ledger.
///
/// Production: `KvBlockStore` over RocksDB (explorer-runtime)
/// Testing: `InMemoryBlockStore`
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Block at an exact height.
    async fn get_by_height(&self, height: u64) -> StoreResult<Option<Block>>;

    /// Block with an exact hash.
    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Block>>;

    /// Block by store surrogate key.
    async fn get_by_id(&self, id: BlockId) -> StoreResult<Option<Block>>;

    /// The block with the greatest height.
    async fn get_latest_by_height(&self) -> StoreResult<Option<Block>>;

    /// Kernel by its public identifier.
    async fn get_kernel_by_id(&self, kernel_id: &str) -> StoreResult<Option<Kernel>>;

    /// Sum of `subsidy` over every stored block, exact in minor units.
    async fn sum_subsidy_all(&self) -> StoreResult<CoinAmount>;

    /// Headers of blocks with `from <= height < to`, ascending by height.
    async fn headers_in_range(&self, from: u64, to: u64) -> StoreResult<Vec<BlockHeader>>;

    /// Per-block count of distinct related entities of the given kinds,
    /// restricted to blocks created inside `window` when one is given.
    async fn count_related_in_window(
        &self,
        kinds: &[EntityKind],
        window: Option<TimeWindow>,
    ) -> StoreResult<Vec<RelatedCount>>;

    /// Blocks by descending height, skipping the `offset` highest and
    /// returning at most `limit`.
    async fn list_blocks(&self, offset: u64, limit: u64) -> StoreResult<Vec<Block>>;
}

#[async_trait]
impl<T: BlockStore + ?Sized> BlockStore for Arc<T> {
    async fn get_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        (**self).get_by_height(height).await
    }

    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Block>> {
        (**self).get_by_hash(hash).await
    }

    async fn get_by_id(&self, id: BlockId) -> StoreResult<Option<Block>> {
        (**self).get_by_id(id).await
    }

    async fn get_latest_by_height(&self) -> StoreResult<Option<Block>> {
        (**self).get_latest_by_height().await
    }

    async fn get_kernel_by_id(&self, kernel_id: &str) -> StoreResult<Option<Kernel>> {
        (**self).get_kernel_by_id(kernel_id).await
    }

    async fn sum_subsidy_all(&self) -> StoreResult<CoinAmount> {
        (**self).sum_subsidy_all().await
    }

    async fn headers_in_range(&self, from: u64, to: u64) -> StoreResult<Vec<BlockHeader>> {
        (**self).headers_in_range(from, to).await
    }

    async fn count_related_in_window(
        &self,
        kinds: &[EntityKind],
        window: Option<TimeWindow>,
    ) -> StoreResult<Vec<RelatedCount>> {
        (**self).count_related_in_window(kinds, window).await
    }

    async fn list_blocks(&self, offset: u64, limit: u64) -> StoreResult<Vec<Block>> {
        (**self).list_blocks(offset, limit).await
    }
}
