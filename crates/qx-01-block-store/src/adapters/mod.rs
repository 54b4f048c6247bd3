//! Block store adapters.
//!
//! - `memory`: `InMemoryBlockStore`, a fully indexed in-process ledger
//! - `kv`: `KvBlockStore`, the ledger read from an ordered key-value database
//! - `kv_memory`: `InMemoryKVStore`, a `BTreeMap` key-value database
//! - `retry`: `RetryingBlockStore`, bounded retry of transient failures

pub mod kv;
pub mod kv_memory;
pub mod memory;
pub mod retry;
