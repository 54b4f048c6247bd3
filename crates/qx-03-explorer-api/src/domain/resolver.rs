//! # Query Resolver
//!
//! Resolves blocks from a height, hash, kernel id or store id, and pages
//! through the chain newest first.
//!
//! Free-text search tries each interpretation in a fixed order and returns
//! the first hit:
//!
//! ```text
//! "103" ──→ Height(103) ──miss──→ KernelId("103") ──miss──→ Hash("103") ──miss──→ NotFound
//! "h104" ─────────────────────────→ KernelId("h104") ──miss──→ Hash("h104") ──hit──→ Block
//! ```

use qx_01_block_store::BlockStore;
use shared_types::{Block, BlockId, Kernel};
use std::sync::Arc;
use tracing::{debug, error};

use super::error::{QueryError, QueryResult};

/// One way of reading a search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    Height(u64),
    KernelId(String),
    Hash(String),
}

impl SearchTerm {
    /// Every interpretation of `raw`, in lookup order.
    ///
    /// Empty or whitespace-only input has no interpretation.
    pub fn interpretations(raw: &str) -> Vec<SearchTerm> {
        if raw.trim().is_empty() {
            return Vec::new();
        }

        let mut chain = Vec::with_capacity(3);
        if let Ok(height) = raw.trim().parse::<u64>() {
            chain.push(SearchTerm::Height(height));
        }
        chain.push(SearchTerm::KernelId(raw.to_string()));
        chain.push(SearchTerm::Hash(raw.to_string()));
        chain
    }
}

/// Field used by an exact-key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactKey {
    Hash,
    Height,
}

/// A window of the newest-first block listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;

    /// Missing values take the defaults; `limit` is capped at `MAX_LIMIT`.
    pub fn new(offset: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).min(Self::MAX_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Block lookups by key.
pub struct QueryResolver {
    store: Arc<dyn BlockStore>,
}

impl QueryResolver {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self { store }
    }

    /// First block matched by height, then kernel id, then hash.
    pub async fn resolve_by_search_term(&self, term: &str) -> QueryResult<Block> {
        for interpretation in SearchTerm::interpretations(term) {
            let found = match &interpretation {
                SearchTerm::Height(height) => self.store.get_by_height(*height).await?,
                SearchTerm::KernelId(kernel_id) => self.block_of_kernel(kernel_id).await?,
                SearchTerm::Hash(hash) => self.store.get_by_hash(hash).await?,
            };

            if let Some(block) = found {
                debug!(?interpretation, height = block.height, "Search term resolved");
                return Ok(block);
            }
        }
        Err(QueryError::NotFound)
    }

    /// Direct lookup on a single field with no fallback.
    pub async fn resolve_by_exact_key(&self, key: ExactKey, value: &str) -> QueryResult<Block> {
        if value.is_empty() {
            return Err(QueryError::NotFound);
        }

        let found = match key {
            ExactKey::Hash => self.store.get_by_hash(value).await?,
            ExactKey::Height => match value.parse::<u64>() {
                Ok(height) => self.store.get_by_height(height).await?,
                Err(_) => None,
            },
        };
        found.ok_or(QueryError::NotFound)
    }

    /// Block by its store id. Anything that is not an id is a miss.
    pub async fn resolve_by_id(&self, raw: &str) -> QueryResult<Block> {
        let Ok(id) = raw.parse::<u64>() else {
            return Err(QueryError::NotFound);
        };
        self.store
            .get_by_id(BlockId(id))
            .await?
            .ok_or(QueryError::NotFound)
    }

    /// One page of blocks, highest first. Past the tip the page is empty.
    pub async fn list_blocks(&self, page: Page) -> QueryResult<Vec<Block>> {
        Ok(self.store.list_blocks(page.offset, page.limit).await?)
    }

    /// Height of the block owning `kernel_id`.
    pub async fn resolve_block_height_by_kernel_id(&self, kernel_id: &str) -> QueryResult<u64> {
        if kernel_id.is_empty() {
            return Err(QueryError::NotFound);
        }

        let kernel = self
            .store
            .get_kernel_by_id(kernel_id)
            .await?
            .ok_or(QueryError::NotFound)?;

        match self.store.get_by_id(kernel.block_id).await? {
            Some(block) => Ok(block.height),
            None => {
                report_dangling(&kernel);
                Err(QueryError::DataIntegrity(format!(
                    "kernel {} references missing block {}",
                    kernel.kernel_id, kernel.block_id
                )))
            }
        }
    }

    /// Owning block of a kernel. A dangling reference is logged and treated
    /// as no match so the search can continue.
    async fn block_of_kernel(&self, kernel_id: &str) -> QueryResult<Option<Block>> {
        let Some(kernel) = self.store.get_kernel_by_id(kernel_id).await? else {
            return Ok(None);
        };

        let block = self.store.get_by_id(kernel.block_id).await?;
        if block.is_none() {
            report_dangling(&kernel);
        }
        Ok(block)
    }
}

fn report_dangling(kernel: &Kernel) {
    error!(
        kernel_id = %kernel.kernel_id,
        block_id = %kernel.block_id,
        "Kernel references a block that does not exist"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use qx_01_block_store::test_utils::{fixture_store, orphan_kernel, ObservedBlockStore};
    use qx_01_block_store::{InMemoryBlockStore, StoreError};

    fn resolver() -> QueryResolver {
        QueryResolver::new(Arc::new(fixture_store()))
    }

    #[test]
    fn test_interpretation_order() {
        assert_eq!(
            SearchTerm::interpretations("103"),
            vec![
                SearchTerm::Height(103),
                SearchTerm::KernelId("103".into()),
                SearchTerm::Hash("103".into()),
            ]
        );
        assert_eq!(
            SearchTerm::interpretations("h104"),
            vec![
                SearchTerm::KernelId("h104".into()),
                SearchTerm::Hash("h104".into()),
            ]
        );
        assert!(SearchTerm::interpretations("").is_empty());
        assert!(SearchTerm::interpretations("   ").is_empty());
    }

    #[tokio::test]
    async fn test_search_by_height_beats_kernel_id() {
        // kernel "103" lives in block 101
        let block = resolver().resolve_by_search_term("103").await.unwrap();
        assert_eq!(block.height, 103);
    }

    #[tokio::test]
    async fn test_search_by_kernel_and_hash() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_by_search_term("k102-2").await.unwrap().height,
            102
        );
        assert_eq!(
            resolver.resolve_by_search_term("h104").await.unwrap().height,
            104
        );
    }

    #[tokio::test]
    async fn test_search_miss() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_by_search_term("zzz").await,
            Err(QueryError::NotFound)
        );
        assert_eq!(
            resolver.resolve_by_search_term("").await,
            Err(QueryError::NotFound)
        );
        assert_eq!(
            resolver.resolve_by_search_term("99").await,
            Err(QueryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_search_continues_past_dangling_kernel() {
        let store = fixture_store();
        store.insert_kernel(orphan_kernel("h103"));
        let resolver = QueryResolver::new(Arc::new(store));

        let block = resolver.resolve_by_search_term("h103").await.unwrap();
        assert_eq!(block.height, 103);
    }

    #[tokio::test]
    async fn test_exact_key_has_no_fallback() {
        let resolver = resolver();
        for height in 100..=105u64 {
            let hash = format!("h{height}");
            let block = resolver
                .resolve_by_exact_key(ExactKey::Hash, &hash)
                .await
                .unwrap();
            assert_eq!(block.hash, hash);
        }

        assert_eq!(
            resolver.resolve_by_exact_key(ExactKey::Hash, "103").await,
            Err(QueryError::NotFound)
        );
        assert_eq!(
            resolver.resolve_by_exact_key(ExactKey::Height, "h103").await,
            Err(QueryError::NotFound)
        );
        assert_eq!(
            resolver.resolve_by_exact_key(ExactKey::Hash, "").await,
            Err(QueryError::NotFound)
        );
        assert_eq!(
            resolver
                .resolve_by_exact_key(ExactKey::Height, "105")
                .await
                .unwrap()
                .hash,
            "h105"
        );
    }

    #[tokio::test]
    async fn test_kernel_height_lookup() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve_block_height_by_kernel_id("103").await,
            Ok(101)
        );
        assert_eq!(
            resolver.resolve_block_height_by_kernel_id("k104").await,
            Ok(104)
        );
        assert_eq!(
            resolver.resolve_block_height_by_kernel_id("nope").await,
            Err(QueryError::NotFound)
        );
        assert_eq!(
            resolver.resolve_block_height_by_kernel_id("").await,
            Err(QueryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_kernel_height_lookup_reports_dangling_reference() {
        let store = InMemoryBlockStore::new();
        store.insert_kernel(orphan_kernel("ghost"));
        let resolver = QueryResolver::new(Arc::new(store));

        assert!(matches!(
            resolver.resolve_block_height_by_kernel_id("ghost").await,
            Err(QueryError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_page_defaults_and_cap() {
        assert_eq!(Page::default(), Page { offset: 0, limit: 20 });
        assert_eq!(Page::new(Some(5), Some(10_000)), Page { offset: 5, limit: 100 });
        assert_eq!(Page::new(None, Some(0)).limit, 0);
    }

    #[tokio::test]
    async fn test_listing_and_id_lookup() {
        let resolver = resolver();
        let heights: Vec<u64> = resolver
            .list_blocks(Page::new(Some(2), Some(2)))
            .await
            .unwrap()
            .iter()
            .map(|b| b.height)
            .collect();
        assert_eq!(heights, vec![103, 102]);
        assert!(resolver
            .list_blocks(Page::new(Some(50), None))
            .await
            .unwrap()
            .is_empty());

        // fixture ids are height + 1
        assert_eq!(resolver.resolve_by_id("104").await.unwrap().height, 103);
        assert_eq!(resolver.resolve_by_id("1").await, Err(QueryError::NotFound));
        assert_eq!(resolver.resolve_by_id("h104").await, Err(QueryError::NotFound));
        assert_eq!(resolver.resolve_by_id("").await, Err(QueryError::NotFound));
    }

    #[tokio::test]
    async fn test_store_outage_is_upstream_unavailable() {
        let store = ObservedBlockStore::new(fixture_store())
            .failing(1, StoreError::Unavailable("refused".into()));
        let resolver = QueryResolver::new(Arc::new(store));

        assert_eq!(
            resolver.resolve_by_search_term("h101").await,
            Err(QueryError::UpstreamUnavailable)
        );
    }
}
