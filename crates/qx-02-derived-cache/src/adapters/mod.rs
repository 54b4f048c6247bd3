//! Cache client adapters.

pub mod memory;
