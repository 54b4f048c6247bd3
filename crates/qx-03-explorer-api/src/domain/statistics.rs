//! # Chain Statistics Aggregator
//!
//! Chain-wide summaries served from the derived-value cache, recomputed from
//! the block store on miss.
//!
//! ## Cached Values
//!
//! | Key | Value | Recomputed from |
//! |-----|-------|-----------------|
//! | `latest_block_height` | `u64` | `get_latest_by_height` |
//! | `latest_block` | `BlockHeader` | `get_latest_by_height` |
//! | `total_emission` | `CoinAmount` (minor units) | `sum_subsidy_all` |
//! | `graph_data` | `Vec<BlockHeader>` | `headers_in_range` |

use explorer_telemetry::LATEST_BLOCK_HEIGHT;
use qx_01_block_store::BlockStore;
use qx_02_derived_cache::{DerivedKey, DerivedValueCache};
use serde::{Deserialize, Serialize};
use shared_types::{BlockHeader, CoinAmount};
use std::sync::Arc;
use tracing::debug;

use super::error::{QueryError, QueryResult};

/// Blocks below the tip included in the charting window.
pub const GRAPH_WINDOW_BLOCKS: u64 = 4320;

/// Coins released from the treasury so far.
pub const COINS_IN_CIRCULATION_TREASURY: u64 = 0;

/// Height of the next scheduled treasury emission.
pub const NEXT_TREASURY_EMISSION_BLOCK_HEIGHT: u64 = 43_800;

/// Next treasury emission as reported inside the status snapshot.
pub const STATUS_NEXT_TREASURY_EMISSION_COIN_AMOUNT: u64 = 876_000;

/// Next treasury emission as reported by its standalone accessor.
///
/// Differs from `STATUS_NEXT_TREASURY_EMISSION_COIN_AMOUNT` by a factor of
/// 10^8; both figures are published as-is.
pub const NEXT_TREASURY_EMISSION_COIN_AMOUNT: u64 = 87_600_000_000_000;

/// Total planned emission, in coins.
pub const TOTAL_EMISSION: u64 = 262_800_000;

/// Status summary: the latest block header plus circulation figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(flatten)]
    pub latest_block: BlockHeader,
    pub coins_in_circulation_mined: f64,
    pub coins_in_circulation_treasury: u64,
    pub total_coins_in_circulation: f64,
    pub next_treasury_emission_block_height: u64,
    pub next_treasury_emission_coin_amount: u64,
    pub total_emission: u64,
}

/// Chain-wide statistics backed by the derived-value cache.
pub struct ChainStatistics {
    store: Arc<dyn BlockStore>,
    cache: Arc<DerivedValueCache>,
    graph_window: u64,
}

impl ChainStatistics {
    pub fn new(store: Arc<dyn BlockStore>, cache: Arc<DerivedValueCache>) -> Self {
        Self {
            store,
            cache,
            graph_window: GRAPH_WINDOW_BLOCKS,
        }
    }

    pub fn with_graph_window(mut self, blocks: u64) -> Self {
        self.graph_window = blocks;
        self
    }

    /// Height of the tip. `NotFound` on an empty chain.
    pub async fn latest_block_height(&self) -> QueryResult<u64> {
        self.cache
            .get_or_compute(DerivedKey::LatestBlockHeight, move || async move {
                let block = self
                    .store
                    .get_latest_by_height()
                    .await?
                    .ok_or(QueryError::NotFound)?;
                LATEST_BLOCK_HEIGHT.set(block.height as f64);
                Ok::<_, QueryError>(block.height)
            })
            .await
    }

    /// Header of the tip block. `NotFound` on an empty chain.
    pub async fn latest_block(&self) -> QueryResult<BlockHeader> {
        self.cache
            .get_or_compute(DerivedKey::LatestBlock, move || async move {
                let block = self
                    .store
                    .get_latest_by_height()
                    .await?
                    .ok_or(QueryError::NotFound)?;
                LATEST_BLOCK_HEIGHT.set(block.height as f64);
                Ok::<_, QueryError>(block.header())
            })
            .await
    }

    /// Sum of subsidy over all blocks, exact in minor units.
    pub async fn mined_emission(&self) -> QueryResult<CoinAmount> {
        self.cache
            .get_or_compute(DerivedKey::TotalEmission, move || async move {
                Ok::<_, QueryError>(self.store.sum_subsidy_all().await?)
            })
            .await
    }

    /// Headers in `[latest - window, latest)`, ascending by height.
    ///
    /// The snapshot is cached as taken and does not advance with the tip
    /// until it is invalidated or expires. An empty chain yields an empty
    /// range, which is not cached.
    pub async fn recent_block_range(&self) -> QueryResult<Vec<BlockHeader>> {
        if let Some(headers) = self.cache.get(DerivedKey::GraphData).await {
            return Ok(headers);
        }

        let latest = match self.latest_block_height().await {
            Ok(height) => height,
            Err(QueryError::NotFound) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let from = latest.saturating_sub(self.graph_window);
        let mut headers = self.store.headers_in_range(from, latest).await?;
        headers.sort_by_key(|h| h.height);
        debug!(from, to = latest, count = headers.len(), "Computed block range");

        self.cache.put(DerivedKey::GraphData, &headers).await;
        Ok(headers)
    }

    /// Latest block header with circulation figures.
    pub async fn status(&self) -> QueryResult<StatusSnapshot> {
        let latest_block = self.latest_block().await?;
        let mined = self.coins_in_circulation_mined().await?;

        Ok(StatusSnapshot {
            latest_block,
            coins_in_circulation_mined: mined,
            coins_in_circulation_treasury: COINS_IN_CIRCULATION_TREASURY,
            // treasury releases are not yet counted here
            total_coins_in_circulation: mined,
            next_treasury_emission_block_height: NEXT_TREASURY_EMISSION_BLOCK_HEIGHT,
            next_treasury_emission_coin_amount: STATUS_NEXT_TREASURY_EMISSION_COIN_AMOUNT,
            total_emission: TOTAL_EMISSION,
        })
    }

    /// Mined coins in display units.
    pub async fn coins_in_circulation_mined(&self) -> QueryResult<f64> {
        Ok(self.mined_emission().await?.as_coins())
    }

    pub fn coins_in_circulation_treasury(&self) -> u64 {
        COINS_IN_CIRCULATION_TREASURY
    }

    /// Equal to the mined figure; treasury releases are not added.
    pub async fn total_coins_in_circulation(&self) -> QueryResult<f64> {
        self.coins_in_circulation_mined().await
    }

    pub fn next_treasury_emission_block_height(&self) -> u64 {
        NEXT_TREASURY_EMISSION_BLOCK_HEIGHT
    }

    pub fn next_treasury_emission_coin_amount(&self) -> u64 {
        NEXT_TREASURY_EMISSION_COIN_AMOUNT
    }

    pub fn total_emission(&self) -> u64 {
        TOTAL_EMISSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qx_01_block_store::test_utils::{
        fixture_store, make_block, ObservedBlockStore, FIXTURE_SUBSIDY,
    };
    use qx_01_block_store::{InMemoryBlockStore, StoreError};
    use qx_02_derived_cache::{CachePolicy, InMemoryCacheClient};
    use std::collections::HashSet;

    fn new_cache() -> Arc<DerivedValueCache> {
        Arc::new(DerivedValueCache::new(
            Arc::new(InMemoryCacheClient::new()),
            CachePolicy::default(),
        ))
    }

    fn fixture_stats() -> (Arc<InMemoryBlockStore>, Arc<DerivedValueCache>, ChainStatistics) {
        let store = Arc::new(fixture_store());
        let cache = new_cache();
        let stats = ChainStatistics::new(store.clone(), cache.clone());
        (store, cache, stats)
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let (_, _, stats) = fixture_stats();
        let status = stats.status().await.unwrap();

        assert_eq!(status.latest_block.height, 105);
        assert_eq!(status.latest_block.hash, "h105");
        assert_eq!(status.coins_in_circulation_mined, 360.0);
        assert_eq!(status.total_coins_in_circulation, 360.0);
        assert_eq!(status.coins_in_circulation_treasury, 0);
        assert_eq!(status.next_treasury_emission_block_height, 43_800);
        assert_eq!(status.next_treasury_emission_coin_amount, 876_000);
        assert_eq!(status.total_emission, 262_800_000);
    }

    #[tokio::test]
    async fn test_status_is_idempotent_without_ingestion() {
        let (_, _, stats) = fixture_stats();
        let first = stats.status().await.unwrap();
        let second = stats.status().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_status_serializes_header_fields_inline() {
        let (_, _, stats) = fixture_stats();
        let json = serde_json::to_value(stats.status().await.unwrap()).unwrap();
        assert_eq!(json["height"], 105);
        assert_eq!(json["hash"], "h105");
        assert_eq!(json["total_emission"], 262_800_000);
    }

    #[tokio::test]
    async fn test_cached_values_skip_the_store() {
        let observed = ObservedBlockStore::new(fixture_store());
        let calls = observed.calls();
        let stats = ChainStatistics::new(Arc::new(observed), new_cache());

        stats.status().await.unwrap();
        let after_first = calls.total();
        stats.status().await.unwrap();
        stats.coins_in_circulation_mined().await.unwrap();

        assert!(after_first > 0);
        assert_eq!(calls.total(), after_first);
    }

    #[tokio::test]
    async fn test_emission_grows_by_appended_subsidy_after_invalidation() {
        let (store, cache, stats) = fixture_stats();
        let before = stats.mined_emission().await.unwrap();

        store.append(make_block(106, 2)).unwrap();

        // stale until invalidated
        assert_eq!(stats.mined_emission().await.unwrap(), before);

        cache.invalidate(DerivedKey::TotalEmission).await;
        let after = stats.mined_emission().await.unwrap();
        assert_eq!(
            after.checked_sub(before),
            Some(CoinAmount::from(FIXTURE_SUBSIDY))
        );
        assert_eq!(
            stats.coins_in_circulation_mined().await.unwrap(),
            420.0
        );
    }

    #[tokio::test]
    async fn test_recent_block_range_bounds_and_order() {
        let (_, _, stats) = fixture_stats();
        let range = stats.recent_block_range().await.unwrap();

        let heights: Vec<u64> = range.iter().map(|h| h.height).collect();
        assert_eq!(heights, vec![100, 101, 102, 103, 104]);

        let unique: HashSet<u64> = heights.iter().copied().collect();
        assert_eq!(unique.len(), heights.len());
        assert!(heights.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_recent_block_range_respects_window() {
        let store = Arc::new(fixture_store());
        let stats = ChainStatistics::new(store, new_cache()).with_graph_window(2);

        let range = stats.recent_block_range().await.unwrap();
        let heights: Vec<u64> = range.iter().map(|h| h.height).collect();
        assert_eq!(heights, vec![103, 104]);
    }

    #[tokio::test]
    async fn test_recent_block_range_snapshot_does_not_advance() {
        let (store, cache, stats) = fixture_stats();
        let first = stats.recent_block_range().await.unwrap();

        store.append(make_block(106, 0)).unwrap();
        assert_eq!(stats.recent_block_range().await.unwrap(), first);

        cache.on_block_ingested().await;
        let refreshed = stats.recent_block_range().await.unwrap();
        assert_eq!(refreshed.last().map(|h| h.height), Some(105));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let stats = ChainStatistics::new(Arc::new(InMemoryBlockStore::new()), new_cache());

        assert_eq!(stats.status().await, Err(QueryError::NotFound));
        assert!(stats.recent_block_range().await.unwrap().is_empty());
        assert_eq!(stats.coins_in_circulation_mined().await.unwrap(), 0.0);
        assert_eq!(stats.total_coins_in_circulation().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_store_outage_is_not_cached() {
        let observed = ObservedBlockStore::new(fixture_store());
        observed.fail_next(1, StoreError::Unavailable("down".into()));
        let stats = ChainStatistics::new(Arc::new(observed), new_cache());

        assert_eq!(
            stats.latest_block_height().await,
            Err(QueryError::UpstreamUnavailable)
        );
        assert_eq!(stats.latest_block_height().await, Ok(105));
    }

    #[test]
    fn test_constant_accessors() {
        let stats = ChainStatistics::new(Arc::new(InMemoryBlockStore::new()), new_cache());
        assert_eq!(stats.coins_in_circulation_treasury(), 0);
        assert_eq!(stats.next_treasury_emission_block_height(), 43_800);
        assert_eq!(stats.next_treasury_emission_coin_amount(), 87_600_000_000_000);
        assert_eq!(stats.total_emission(), 262_800_000);
    }
}
