//! # Resilience Flows
//!
//! Store outages, a closed cache and concurrent readers.

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use explorer_runtime::Explorer;
    use qx_01_block_store::test_utils::{fixture_store, ObservedBlockStore};
    use qx_01_block_store::StoreError;
    use qx_03_explorer_api::{ExplorerConfig, QueryError};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn explorer_over(store: Arc<ObservedBlockStore<qx_01_block_store::InMemoryBlockStore>>) -> Explorer {
        let mut config = ExplorerConfig::default();
        config.store.retry_attempts = 2;
        config.store.call_timeout = Some(Duration::from_millis(200));
        Explorer::over_store(&config, store).unwrap()
    }

    async fn status_code(explorer: &Explorer, uri: &str) -> (StatusCode, String) {
        let response = explorer
            .router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_then_recovery() {
        let store = Arc::new(ObservedBlockStore::new(fixture_store()));
        let explorer = explorer_over(store.clone());

        store.fail_next(usize::MAX, StoreError::Unavailable("connection refused".into()));
        let (status, body) = status_code(&explorer, "/get_status").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, r#"["Service unavailable"]"#);
        assert!(!body.contains("refused"));

        store.heal();
        let (status, _) = status_code(&explorer, "/get_status").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let store = Arc::new(
            ObservedBlockStore::new(fixture_store()).with_latency(Duration::from_secs(1)),
        );
        let calls = store.calls();
        let explorer = explorer_over(store);

        assert_eq!(
            explorer.service.search("h101").await,
            Err(QueryError::UpstreamUnavailable)
        );
        // two attempts at the first step of the chain
        assert_eq!(calls.total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_data_is_not_retried() {
        let store = Arc::new(
            ObservedBlockStore::new(fixture_store())
                .failing(1, StoreError::Corrupt("bad record".into())),
        );
        let calls = store.calls();
        let explorer = explorer_over(store);

        assert!(matches!(
            explorer.service.get_block_by_hash("h100").await,
            Err(QueryError::DataIntegrity(_))
        ));
        assert_eq!(calls.total(), 1);
    }

    #[tokio::test]
    async fn test_closed_cache_still_serves() {
        let store = Arc::new(ObservedBlockStore::new(fixture_store()));
        let calls = store.calls();
        let explorer = explorer_over(store);

        let before = explorer.service.get_status().await.unwrap();
        explorer.service.shutdown().await;

        calls.reset();
        assert_eq!(explorer.service.get_status().await.unwrap(), before);
        assert!(calls.count("get_latest_by_height") >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_agree() {
        let store = Arc::new(ObservedBlockStore::new(fixture_store()));
        let explorer = Arc::new(explorer_over(store));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let explorer = Arc::clone(&explorer);
                tokio::spawn(async move { explorer.service.get_status().await })
            })
            .collect();

        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap().unwrap());
        }
        assert!(snapshots.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(snapshots[0].latest_block.height, 105);
    }
}
