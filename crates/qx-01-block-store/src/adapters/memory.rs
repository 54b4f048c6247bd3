//! In-process block store.
//!
//! Holds the whole ledger behind a `parking_lot::RwLock` with the same
//! indexes the key-value layout keeps: height, hash, id and kernel id.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    Block, BlockHeader, BlockId, CoinAmount, EntityKind, Kernel, RelatedCount, TimeWindow,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::domain::errors::{StoreError, StoreResult};
use crate::ports::inbound::BlockStore;

#[derive(Default)]
struct Ledger {
    by_height: BTreeMap<u64, Block>,
    height_by_hash: HashMap<String, u64>,
    height_by_id: HashMap<BlockId, u64>,
    kernels: HashMap<String, Kernel>,
}

/// Append-only ledger kept in memory.
#[derive(Default)]
pub struct InMemoryBlockStore {
    ledger: RwLock<Ledger>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from blocks given in ascending height order.
    pub fn with_blocks(blocks: impl IntoIterator<Item = Block>) -> StoreResult<Self> {
        let store = Self::new();
        for block in blocks {
            store.append(block)?;
        }
        Ok(store)
    }

    /// Append a block above the current tip.
    ///
    /// This is the ingester's write path; the query layer never calls it.
    pub fn append(&self, block: Block) -> StoreResult<()> {
        let mut ledger = self.ledger.write();

        if let Some((&tip, _)) = ledger.by_height.last_key_value() {
            if block.height <= tip {
                return Err(StoreError::OutOfOrder {
                    height: block.height,
                    tip,
                });
            }
        }

        debug!(height = block.height, hash = %block.hash, "Appending block");

        for kernel in &block.kernels {
            ledger
                .kernels
                .insert(kernel.kernel_id.clone(), kernel.clone());
        }
        ledger.height_by_hash.insert(block.hash.clone(), block.height);
        ledger.height_by_id.insert(block.id, block.height);
        ledger.by_height.insert(block.height, block);
        Ok(())
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.ledger.read().by_height.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.read().by_height.is_empty()
    }

    /// Register a kernel without its owning block.
    ///
    /// Reproduces a dangling `block_id` reference for integrity tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn insert_kernel(&self, kernel: Kernel) {
        self.ledger
            .write()
            .kernels
            .insert(kernel.kernel_id.clone(), kernel);
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn get_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        Ok(self.ledger.read().by_height.get(&height).cloned())
    }

    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Block>> {
        let ledger = self.ledger.read();
        Ok(ledger
            .height_by_hash
            .get(hash)
            .and_then(|height| ledger.by_height.get(height))
            .cloned())
    }

    async fn get_by_id(&self, id: BlockId) -> StoreResult<Option<Block>> {
        let ledger = self.ledger.read();
        Ok(ledger
            .height_by_id
            .get(&id)
            .and_then(|height| ledger.by_height.get(height))
            .cloned())
    }

    async fn get_latest_by_height(&self) -> StoreResult<Option<Block>> {
        Ok(self
            .ledger
            .read()
            .by_height
            .last_key_value()
            .map(|(_, block)| block.clone()))
    }

    async fn get_kernel_by_id(&self, kernel_id: &str) -> StoreResult<Option<Kernel>> {
        Ok(self.ledger.read().kernels.get(kernel_id).cloned())
    }

    async fn sum_subsidy_all(&self) -> StoreResult<CoinAmount> {
        Ok(self
            .ledger
            .read()
            .by_height
            .values()
            .map(|block| CoinAmount::from(block.subsidy))
            .sum())
    }

    async fn headers_in_range(&self, from: u64, to: u64) -> StoreResult<Vec<BlockHeader>> {
        if from >= to {
            return Ok(Vec::new());
        }
        Ok(self
            .ledger
            .read()
            .by_height
            .range(from..to)
            .map(|(_, block)| block.header())
            .collect())
    }

    async fn count_related_in_window(
        &self,
        kinds: &[EntityKind],
        window: Option<TimeWindow>,
    ) -> StoreResult<Vec<RelatedCount>> {
        Ok(self
            .ledger
            .read()
            .by_height
            .values()
            .filter(|block| window.map_or(true, |w| w.contains(block.created_at)))
            .map(|block| RelatedCount {
                block_id: block.id,
                height: block.height,
                count: block.weight(kinds),
            })
            .collect())
    }

    async fn list_blocks(&self, offset: u64, limit: u64) -> StoreResult<Vec<Block>> {
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .ledger
            .read()
            .by_height
            .values()
            .rev()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }
}
