//! # Ingestion Flows
//!
//! The external ingester appends blocks; the explorer notices through the
//! tip watcher and recomputes its derived values.

#[cfg(test)]
mod tests {
    use explorer_runtime::Explorer;
    use qx_01_block_store::test_utils::{fixture_blocks, fixture_store, make_block, FIXTURE_SUBSIDY};
    use qx_01_block_store::{BlockStore, InMemoryKVStore, KvBlockStore};
    use qx_03_explorer_api::{ExplorerConfig, ExplorerService, Page, QueryError};
    use qx_02_derived_cache::InMemoryCacheClient;
    use std::sync::Arc;
    use std::time::Duration;

    // =========================================================================
    // TIP MOVEMENT
    // =========================================================================

    #[tokio::test]
    async fn test_emission_grows_by_exact_subsidy_per_block() {
        let store = Arc::new(fixture_store());
        let explorer = Explorer::over_store(&ExplorerConfig::default(), store.clone()).unwrap();
        let mut watcher = explorer.tip_watcher(Duration::from_secs(1));
        watcher.poll_once().await;

        let mut previous = explorer.service.get_coins_in_circulation_mined().await.unwrap();
        for height in 106..=110 {
            store.append(make_block(height, height % 3)).unwrap();
            assert!(watcher.poll_once().await);

            let current = explorer.service.get_coins_in_circulation_mined().await.unwrap();
            assert_eq!(current - previous, FIXTURE_SUBSIDY as f64 / 1e8);
            assert_eq!(
                explorer.service.get_status().await.unwrap().latest_block.height,
                height
            );
            previous = current;
        }
    }

    #[tokio::test]
    async fn test_block_range_follows_tip_after_invalidation() {
        let store = Arc::new(fixture_store());
        let mut config = ExplorerConfig::default();
        config.statistics.graph_window_blocks = 3;
        let explorer = Explorer::over_store(&config, store.clone()).unwrap();

        let heights = |headers: Vec<shared_types::BlockHeader>| -> Vec<u64> {
            headers.into_iter().map(|h| h.height).collect()
        };
        assert_eq!(
            heights(explorer.service.get_block_range().await.unwrap()),
            vec![102, 103, 104]
        );

        store.append(make_block(106, 1)).unwrap();
        // cached snapshot until the ingestion hook fires
        assert_eq!(
            heights(explorer.service.get_block_range().await.unwrap()),
            vec![102, 103, 104]
        );

        explorer.service.on_block_ingested().await;
        assert_eq!(
            heights(explorer.service.get_block_range().await.unwrap()),
            vec![103, 104, 105]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_without_watcher() {
        let store = Arc::new(fixture_store());
        let mut config = ExplorerConfig::default();
        config.cache.latest_block_ttl = Some(Duration::from_secs(30));
        config.cache.total_emission_ttl = Some(Duration::from_secs(30));
        let explorer = Explorer::over_store(&config, store.clone()).unwrap();

        assert_eq!(explorer.service.get_status().await.unwrap().latest_block.height, 105);
        store.append(make_block(106, 0)).unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(explorer.service.get_status().await.unwrap().latest_block.height, 105);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(explorer.service.get_status().await.unwrap().latest_block.height, 106);
    }

    // =========================================================================
    // KEY-VALUE BACKEND PARITY
    // =========================================================================

    fn service_over(store: Arc<dyn BlockStore>) -> ExplorerService {
        let mut config = ExplorerConfig::default();
        config.access.major_block_key = Some("k".into());
        ExplorerService::new(&config, store, Arc::new(InMemoryCacheClient::new())).unwrap()
    }

    #[tokio::test]
    async fn test_kv_backend_answers_like_memory_backend() {
        let kv = InMemoryKVStore::new();
        for block in fixture_blocks() {
            kv.insert_block(&block).unwrap();
        }
        let over_kv = service_over(Arc::new(KvBlockStore::new(kv)));
        let over_memory = service_over(Arc::new(fixture_store()));

        for term in ["100", "103", "h104", "k105", "k102-2", "zzz", ""] {
            assert_eq!(
                over_kv.search(term).await,
                over_memory.search(term).await,
                "search {term:?}"
            );
        }
        assert_eq!(over_kv.get_status().await, over_memory.get_status().await);
        assert_eq!(
            over_kv.get_block_range().await,
            over_memory.get_block_range().await
        );
        assert_eq!(
            over_kv.get_major_block("k", None).await,
            over_memory.get_major_block("k", None).await
        );
        assert_eq!(
            over_kv.get_block_height_by_kernel("nope").await,
            Err(QueryError::NotFound)
        );
        for page in [Page::default(), Page::new(Some(2), Some(3)), Page::new(Some(9), None)] {
            assert_eq!(
                over_kv.list_blocks(page).await,
                over_memory.list_blocks(page).await,
                "page {page:?}"
            );
        }
        assert_eq!(
            over_kv.get_block_by_id("103").await,
            over_memory.get_block_by_id("103").await
        );
    }
}
