//! # HTTP Flows
//!
//! Requests against a fully wired explorer: seed file → memory store →
//! retry decorator → derived-value cache → service → axum router.

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use explorer_runtime::{Explorer, RuntimeConfig};
    use qx_01_block_store::test_utils::{fixture_blocks, FIXTURE_HEAVIEST_HEIGHT};
    use serde_json::{json, Value};
    use std::io::Write;
    use tower::ServiceExt;

    const KEY: &str = "E9B60D665A110DD4AAE1D36AF633FF25";

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn seeded_explorer() -> (Explorer, tempfile::NamedTempFile) {
        let mut seed = tempfile::NamedTempFile::new().unwrap();
        seed.write_all(serde_json::to_string(&fixture_blocks()).unwrap().as_bytes())
            .unwrap();
        let seed_path = seed.path().to_string_lossy().to_string();

        let config = RuntimeConfig::load(|name| match name {
            "EXPLORER_SEED_FILE" => Some(seed_path.clone()),
            "EXPLORER_MAJOR_BLOCK_KEY" => Some(KEY.to_string()),
            _ => None,
        })
        .unwrap();
        (Explorer::build(&config).unwrap(), seed)
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    #[tokio::test]
    async fn test_search_fixture_terms() {
        let (explorer, _seed) = seeded_explorer();
        let router = explorer.router();

        let (status, body) = get(&router, "/search?q=103").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["height"], 103);
        assert_eq!(body["hash"], "h103");

        let (_, body) = get(&router, "/search?q=h104").await;
        assert_eq!(body["height"], 104);

        let (status, body) = get(&router, "/search?q=zzz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "found": false }));
    }

    #[tokio::test]
    async fn test_every_block_round_trips_by_hash() {
        let (explorer, _seed) = seeded_explorer();
        let router = explorer.router();

        for block in fixture_blocks() {
            let (status, body) = get(&router, &format!("/get_block?hash={}", block.hash)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, serde_json::to_value(&block).unwrap());
        }
    }

    #[tokio::test]
    async fn test_kernel_lookup() {
        let (explorer, _seed) = seeded_explorer();
        let router = explorer.router();

        let (status, body) = get(&router, "/get_block_by_kernel?kernel_id=k102-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "block": 102 }));

        let (status, body) = get(&router, "/get_block_by_kernel?kernel_id=unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!(["Incorrect kernel id"]));
    }

    // =========================================================================
    // AGGREGATES
    // =========================================================================

    #[tokio::test]
    async fn test_status_is_stable_across_requests() {
        let (explorer, _seed) = seeded_explorer();
        let router = explorer.router();

        let (_, first) = get(&router, "/get_status").await;
        let (_, second) = get(&router, "/get_status").await;
        assert_eq!(first, second);
        assert_eq!(first["height"], 105);
        assert_eq!(first["coins_in_circulation_mined"], 360.0);
        assert_eq!(first["total_coins_in_circulation"], 360.0);

        let stats = explorer.service.cache_stats();
        assert!(stats.hits >= 2);
    }

    #[tokio::test]
    async fn test_block_range_shape() {
        let (explorer, _seed) = seeded_explorer();
        let (status, body) = get(&explorer.router(), "/get_block_range").await;
        assert_eq!(status, StatusCode::OK);

        let heights: Vec<u64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["height"].as_u64().unwrap())
            .collect();
        assert!(heights.windows(2).all(|w| w[0] < w[1]));
        assert!(heights.iter().all(|h| *h < 105));
        assert_eq!(heights.first(), Some(&100));
    }

    // =========================================================================
    // ACCESS-GATED QUERY
    // =========================================================================

    #[tokio::test]
    async fn test_major_block_gate() {
        let (explorer, _seed) = seeded_explorer();
        let router = explorer.router();

        for key in ["", "e9b60d665a110dd4aae1d36af633ff25", "E9B60D665A110DD4AAE1D36AF633FF2"] {
            let (status, body) = get(&router, &format!("/get_major_block?key={key}")).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!(["Incorrect access key"]));
        }

        let (status, body) = get(&router, &format!("/get_major_block?key={KEY}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["height"], FIXTURE_HEAVIEST_HEIGHT);

        // fixture blocks are two or more years old
        let (status, _) = get(&router, &format!("/get_major_block?key={KEY}&period=24")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
