//! # Ledger Explorer Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── query_benchmarks.rs   # cached vs recomputed aggregates
//! └── src/integration/
//!     ├── http_flows.rs         # HTTP surface over a wired explorer
//!     ├── ingestion.rs          # tip movement, invalidation, KV parity
//!     └── resilience.rs         # store outages, closed cache, concurrency
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qx-tests
//! cargo test -p qx-tests integration::ingestion::
//! cargo bench -p qx-tests
//! ```

pub mod integration;
