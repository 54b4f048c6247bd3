//! Explorer service: the operations exposed to clients.
//!
//! Wires the resolver, the statistics aggregator and the access-gated query
//! onto one block store and one derived-value cache, and records per
//! operation outcome and latency.

use explorer_telemetry::{QUERIES, QUERY_DURATION};
use qx_01_block_store::BlockStore;
use qx_02_derived_cache::{CacheClient, CacheStatsSnapshot, DerivedValueCache};
use shared_types::{Block, BlockHeader};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::domain::access::{AccessKey, HeaviestBlockQuery};
use crate::domain::config::{ConfigError, ExplorerConfig};
use crate::domain::error::QueryResult;
use crate::domain::resolver::{ExactKey, Page, QueryResolver};
use crate::domain::statistics::{ChainStatistics, StatusSnapshot};
use crate::ports::outbound::{SystemTimeSource, TimeSource};

/// Read-only explorer queries over a block store.
pub struct ExplorerService {
    resolver: QueryResolver,
    statistics: ChainStatistics,
    heaviest: HeaviestBlockQuery,
    cache: Arc<DerivedValueCache>,
}

impl ExplorerService {
    /// Create a service using the system clock.
    pub fn new(
        config: &ExplorerConfig,
        store: Arc<dyn BlockStore>,
        cache_client: Arc<dyn CacheClient>,
    ) -> Result<Self, ConfigError> {
        Self::with_time_source(config, store, cache_client, Arc::new(SystemTimeSource))
    }

    /// Create a service with an explicit clock for the windowed queries.
    pub fn with_time_source(
        config: &ExplorerConfig,
        store: Arc<dyn BlockStore>,
        cache_client: Arc<dyn CacheClient>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let cache = Arc::new(DerivedValueCache::new(cache_client, config.cache.policy()));
        let access_key = AccessKey::new(config.access.major_block_key.clone());
        if !access_key.is_configured() {
            warn!("No major block key configured; heaviest block queries will be rejected");
        }

        Ok(Self {
            resolver: QueryResolver::new(Arc::clone(&store)),
            statistics: ChainStatistics::new(Arc::clone(&store), Arc::clone(&cache))
                .with_graph_window(config.statistics.graph_window_blocks),
            heaviest: HeaviestBlockQuery::new(store, access_key, clock),
            cache,
        })
    }

    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> QueryResult<Block> {
        observe("search", self.resolver.resolve_by_search_term(term)).await
    }

    #[instrument(skip(self))]
    pub async fn get_block_by_hash(&self, hash: &str) -> QueryResult<Block> {
        observe(
            "get_block",
            self.resolver.resolve_by_exact_key(ExactKey::Hash, hash),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_block_by_height(&self, height: &str) -> QueryResult<Block> {
        observe(
            "get_block_by_height",
            self.resolver.resolve_by_exact_key(ExactKey::Height, height),
        )
        .await
    }

    /// Newest-first block listing.
    #[instrument(skip(self))]
    pub async fn list_blocks(&self, page: Page) -> QueryResult<Vec<Block>> {
        observe("list_blocks", self.resolver.list_blocks(page)).await
    }

    #[instrument(skip(self))]
    pub async fn get_block_by_id(&self, id: &str) -> QueryResult<Block> {
        observe("get_block_by_id", self.resolver.resolve_by_id(id)).await
    }

    #[instrument(skip(self))]
    pub async fn get_block_height_by_kernel(&self, kernel_id: &str) -> QueryResult<u64> {
        observe(
            "get_block_by_kernel",
            self.resolver.resolve_block_height_by_kernel_id(kernel_id),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_status(&self) -> QueryResult<StatusSnapshot> {
        observe("get_status", self.statistics.status()).await
    }

    #[instrument(skip(self))]
    pub async fn get_block_range(&self) -> QueryResult<Vec<BlockHeader>> {
        observe("get_block_range", self.statistics.recent_block_range()).await
    }

    /// Heaviest block, gated by the access key. The key is never logged.
    #[instrument(skip(self, provided_key))]
    pub async fn get_major_block(
        &self,
        provided_key: &str,
        period_hours: Option<u32>,
    ) -> QueryResult<Block> {
        observe(
            "get_major_block",
            self.heaviest.heaviest_block(provided_key, period_hours),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_coins_in_circulation_mined(&self) -> QueryResult<f64> {
        observe(
            "get_coins_in_circulation_mined",
            self.statistics.coins_in_circulation_mined(),
        )
        .await
    }

    pub fn get_coins_in_circulation_treasury(&self) -> u64 {
        self.statistics.coins_in_circulation_treasury()
    }

    #[instrument(skip(self))]
    pub async fn get_total_coins_in_circulation(&self) -> QueryResult<f64> {
        observe(
            "get_total_coins_in_circulation",
            self.statistics.total_coins_in_circulation(),
        )
        .await
    }

    pub fn get_next_treasury_emission_block_height(&self) -> u64 {
        self.statistics.next_treasury_emission_block_height()
    }

    pub fn get_next_treasury_emission_coin_amount(&self) -> u64 {
        self.statistics.next_treasury_emission_coin_amount()
    }

    pub fn get_total_emission(&self) -> u64 {
        self.statistics.total_emission()
    }

    /// Drop every chain-tip value so the next read recomputes it.
    pub async fn on_block_ingested(&self) {
        self.cache.on_block_ingested().await;
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    /// Close the cache client. Queries keep working against the store.
    pub async fn shutdown(&self) {
        match self.cache.close().await {
            Ok(()) => info!("Derived-value cache closed"),
            Err(e) => warn!(error = %e, "Failed to close derived-value cache"),
        }
    }
}

async fn observe<T, F>(operation: &'static str, query: F) -> QueryResult<T>
where
    F: Future<Output = QueryResult<T>>,
{
    let started = Instant::now();
    let result = query.await;
    QUERY_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    QUERIES.with_label_values(&[operation, outcome]).inc();
    result
}
