//! # Explorer Query Benchmarks
//!
//! | Query | Path | Expectation |
//! |-------|------|-------------|
//! | status | cache hit | flat in chain length |
//! | status | recomputed after invalidation | linear in chain length |
//! | search by hash | store lookup | flat in chain length |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qx_01_block_store::test_utils::make_block;
use qx_01_block_store::InMemoryBlockStore;
use qx_02_derived_cache::InMemoryCacheClient;
use qx_03_explorer_api::{ExplorerConfig, ExplorerService};
use std::sync::Arc;

fn service_with_chain(length: u64) -> ExplorerService {
    let store = InMemoryBlockStore::with_blocks((1..=length).map(|h| make_block(h, h % 5)))
        .expect("chain fixture");
    ExplorerService::new(
        &ExplorerConfig::default(),
        Arc::new(store),
        Arc::new(InMemoryCacheClient::new()),
    )
    .expect("explorer service")
}

fn bench_status(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("explorer-status");

    for length in [1_000u64, 10_000, 50_000] {
        let service = service_with_chain(length);
        rt.block_on(service.get_status()).expect("warm cache");

        group.bench_with_input(BenchmarkId::new("cached", length), &length, |b, _| {
            b.to_async(&rt)
                .iter(|| async { black_box(service.get_status().await) })
        });

        group.bench_with_input(BenchmarkId::new("recomputed", length), &length, |b, _| {
            b.to_async(&rt).iter(|| async {
                service.on_block_ingested().await;
                black_box(service.get_status().await)
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let service = service_with_chain(50_000);
    let mut group = c.benchmark_group("explorer-search");

    group.bench_function("by_height", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(service.search("25000").await) })
    });
    group.bench_function("by_hash", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(service.search("h25000").await) })
    });
    group.finish();
}

criterion_group!(benches, bench_status, bench_search);
criterion_main!(benches);
