//! # Explorer API
//!
//! Read-only queries over a ledger of blocks, kernels, inputs and outputs.
//!
//! ## Operations
//!
//! | Operation | Source | Cached |
//! |-----------|--------|--------|
//! | search by height, kernel id or hash | [`QueryResolver`] | no |
//! | block by hash or height | [`QueryResolver`] | no |
//! | block height by kernel id | [`QueryResolver`] | no |
//! | status, recent block range, emission | [`ChainStatistics`] | yes |
//! | heaviest block (access key) | [`HeaviestBlockQuery`] | no |
//!
//! ## Architecture
//!
//! - `domain`: query semantics, configuration and the error taxonomy
//! - `ports`: the clock used by windowed queries
//! - `service`: [`ExplorerService`], one entry point per operation
//! - `router`: the thin axum adapter
//!
//! ## Usage
//!
//! ```rust,ignore
//! let service = Arc::new(ExplorerService::new(&config, store, cache_client)?);
//! let router = build_router(Arc::clone(&service), &config.http);
//! axum::serve(listener, router).await?;
//! service.shutdown().await;
//! ```

pub mod domain;
pub mod ports;
pub mod router;
pub mod service;

pub use domain::{
    AccessKey, ChainStatistics, ConfigError, ExactKey, ExplorerConfig, HeaviestBlockQuery,
    Page, QueryError, QueryResolver, QueryResult, SearchTerm, StatusSnapshot,
};
pub use ports::outbound::{FixedTimeSource, SystemTimeSource, TimeSource};
pub use router::{build_router, ApiError, AppState};
pub use service::ExplorerService;
