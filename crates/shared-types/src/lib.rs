//! # Shared Types Crate
//!
//! Ledger entities and value types shared by every explorer crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Block`, `Kernel`, `Input` and `Output` are
//!   defined once here and read by the store, cache and query layers.
//! - **Append-only**: nothing in this crate mutates a stored entity. Blocks are
//!   immutable once written by the external ingester.
//! - **Exact amounts**: coin amounts are carried as minor units and only scaled
//!   to display units at the edge (`CoinAmount::as_coins`).

pub mod amounts;
pub mod entities;
pub mod window;

pub use amounts::{CoinAmount, MINOR_UNITS_PER_COIN};
pub use entities::*;
pub use window::TimeWindow;
