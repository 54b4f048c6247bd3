//! Block store over an ordered key-value database.
//!
//! Reads the record layout described in `domain::keys`. Index entries that
//! point at missing records surface as `StoreError::Corrupt`.
//!
//! Key-value calls block, so every read runs on tokio's blocking pool. The
//! returned future can then be raced against a deadline or dropped, and
//! the async workers never stall behind a slow disk.

use async_trait::async_trait;
use shared_types::{
    Block, BlockHeader, BlockId, CoinAmount, EntityKind, Kernel, RelatedCount, TimeWindow,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{error, trace};

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::keys::{decode_block, decode_block_id, decode_kernel, KeyPrefix};
use crate::ports::inbound::BlockStore;
use crate::ports::outbound::{KeyValueStore, ScanDirection};

/// `BlockStore` backed by any `KeyValueStore`.
pub struct KvBlockStore<KV: KeyValueStore + 'static> {
    kv: Arc<KV>,
}

impl<KV: KeyValueStore + 'static> KvBlockStore<KV> {
    pub fn new(kv: KV) -> Self {
        Self::from_shared(Arc::new(kv))
    }

    /// Read through a database handle that is also used elsewhere.
    pub fn from_shared(kv: Arc<KV>) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &KV {
        &self.kv
    }

    /// Run `read` against the database on the blocking pool.
    async fn read<T, F>(&self, operation: &'static str, read: F) -> StoreResult<T>
    where
        F: FnOnce(&KV) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let kv = Arc::clone(&self.kv);
        tokio::task::spawn_blocking(move || read(&*kv))
            .await
            .map_err(|e| {
                error!(operation, error = %e, "Key-value read task failed");
                StoreError::Unavailable(format!("{} did not complete: {}", operation, e))
            })?
    }
}

fn load_block<KV: KeyValueStore + ?Sized>(kv: &KV, id: BlockId) -> StoreResult<Option<Block>> {
    match kv.get(&KeyPrefix::block_key(id))? {
        Some(bytes) => decode_block(&bytes).map(Some),
        None => Ok(None),
    }
}

/// Follow an index entry to its block; a dangling entry is corruption.
fn follow_index<KV: KeyValueStore + ?Sized>(
    kv: &KV,
    index_key: &[u8],
    id_bytes: &[u8],
) -> StoreResult<Block> {
    let id = decode_block_id(id_bytes)?;
    load_block(kv, id)?.ok_or_else(|| {
        let key = String::from_utf8_lossy(index_key).into_owned();
        error!(%key, block_id = %id, "Index entry points at a missing block");
        StoreError::Corrupt(format!("index {} references missing block {}", key, id))
    })
}

fn lookup_index<KV: KeyValueStore + ?Sized>(kv: &KV, index_key: &[u8]) -> StoreResult<Option<Block>> {
    match kv.get(index_key)? {
        Some(id_bytes) => follow_index(kv, index_key, &id_bytes).map(Some),
        None => Ok(None),
    }
}

/// Decode every block record in id order, handing each to `visit`.
///
/// Blocks are dropped after the visit; the chain is never held in memory.
fn for_each_block<KV: KeyValueStore + ?Sized>(
    kv: &KV,
    mut visit: impl FnMut(Block),
) -> StoreResult<()> {
    let mut failure = None;
    kv.visit_prefix(
        KeyPrefix::Block.as_bytes(),
        ScanDirection::Forward,
        &mut |_, bytes| match decode_block(bytes) {
            Ok(block) => {
                visit(block);
                ControlFlow::Continue(())
            }
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        },
    )?;
    failure.map_or(Ok(()), Err)
}

#[async_trait]
impl<KV: KeyValueStore + 'static> BlockStore for KvBlockStore<KV> {
    async fn get_by_height(&self, height: u64) -> StoreResult<Option<Block>> {
        self.read("get_by_height", move |kv| {
            lookup_index(kv, &KeyPrefix::height_key(height))
        })
        .await
    }

    async fn get_by_hash(&self, hash: &str) -> StoreResult<Option<Block>> {
        let index_key = KeyPrefix::hash_key(hash);
        self.read("get_by_hash", move |kv| lookup_index(kv, &index_key))
            .await
    }

    async fn get_by_id(&self, id: BlockId) -> StoreResult<Option<Block>> {
        self.read("get_by_id", move |kv| load_block(kv, id)).await
    }

    async fn get_latest_by_height(&self) -> StoreResult<Option<Block>> {
        self.read("get_latest_by_height", |kv| {
            match kv.last_in_prefix(KeyPrefix::BlockByHeight.as_bytes())? {
                Some((key, id_bytes)) => follow_index(kv, &key, &id_bytes).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    async fn get_kernel_by_id(&self, kernel_id: &str) -> StoreResult<Option<Kernel>> {
        let key = KeyPrefix::kernel_key(kernel_id);
        self.read("get_kernel_by_id", move |kv| match kv.get(&key)? {
            Some(bytes) => decode_kernel(&bytes).map(Some),
            None => Ok(None),
        })
        .await
    }

    async fn sum_subsidy_all(&self) -> StoreResult<CoinAmount> {
        self.read("sum_subsidy_all", |kv| {
            let mut total = CoinAmount::ZERO;
            let mut blocks = 0usize;
            for_each_block(kv, |block| {
                total = total.saturating_add(CoinAmount::from(block.subsidy));
                blocks += 1;
            })?;
            trace!(blocks, "Summed subsidy over full scan");
            Ok(total)
        })
        .await
    }

    async fn headers_in_range(&self, from: u64, to: u64) -> StoreResult<Vec<BlockHeader>> {
        self.read("headers_in_range", move |kv| {
            kv.range_scan(&KeyPrefix::height_key(from), &KeyPrefix::height_key(to))?
                .iter()
                .map(|(key, id_bytes)| follow_index(kv, key, id_bytes).map(|b| b.header()))
                .collect()
        })
        .await
    }

    async fn count_related_in_window(
        &self,
        kinds: &[EntityKind],
        window: Option<TimeWindow>,
    ) -> StoreResult<Vec<RelatedCount>> {
        let kinds = kinds.to_vec();
        self.read("count_related_in_window", move |kv| {
            let mut counts = Vec::new();
            for_each_block(kv, |block| {
                if window.map_or(true, |w| w.contains(block.created_at)) {
                    counts.push(RelatedCount {
                        block_id: block.id,
                        height: block.height,
                        count: block.weight(&kinds),
                    });
                }
            })?;
            Ok(counts)
        })
        .await
    }

    async fn list_blocks(&self, offset: u64, limit: u64) -> StoreResult<Vec<Block>> {
        self.read("list_blocks", move |kv| {
            let mut skip = offset;
            let mut page = Vec::new();
            if limit > 0 {
                kv.visit_prefix(
                    KeyPrefix::BlockByHeight.as_bytes(),
                    ScanDirection::Reverse,
                    &mut |key, id_bytes| {
                        if skip > 0 {
                            skip -= 1;
                            return ControlFlow::Continue(());
                        }
                        page.push((key.to_vec(), id_bytes.to_vec()));
                        if page.len() as u64 >= limit {
                            ControlFlow::Break(())
                        } else {
                            ControlFlow::Continue(())
                        }
                    },
                )?;
            }
            page.iter()
                .map(|(key, id_bytes)| follow_index(kv, key, id_bytes))
                .collect()
        })
        .await
    }
}
