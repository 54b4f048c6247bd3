//! Cross-crate flows: store → cache → service → HTTP.

pub mod http_flows;
pub mod ingestion;
pub mod resilience;
