//! Cache errors.
//!
//! These never reach callers of `DerivedValueCache`; a failing cache reads as
//! a miss and the value is recomputed from the block store.

use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The client was closed at shutdown.
    #[error("cache client is closed")]
    Closed,

    /// Stored payload could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}
