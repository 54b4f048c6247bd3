//! # Domain Errors
//!
//! Error types for the block store.
//!
//! "Not found" is never an error here: lookups return `Ok(None)` and the
//! query layer decides what absence means.

use std::fmt;
use thiserror::Error;

/// Result alias for block store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reading from the block store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend could not be reached or returned an I/O failure.
    #[error("block store unavailable: {0}")]
    Unavailable(String),

    /// A single call exceeded its deadline.
    #[error("block store call `{operation}` timed out")]
    Timeout { operation: &'static str },

    /// An index entry points at a record that does not exist, or a record
    /// fails an integrity check.
    #[error("block store corruption: {0}")]
    Corrupt(String),

    /// A stored record could not be decoded.
    #[error("block store codec error: {0}")]
    Codec(String),

    /// Append below or at the current tip.
    #[error("block at height {height} does not extend tip {tip}")]
    OutOfOrder { height: u64, tip: u64 },
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout { .. })
    }
}

/// Key-value backend errors.
#[derive(Debug, Clone)]
pub enum KVStoreError {
    /// I/O error during read.
    IOError { message: String },
    /// Data corruption reported by the backend.
    CorruptionError { message: String },
}

impl fmt::Display for KVStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KVStoreError::IOError { message } => write!(f, "KV store I/O error: {}", message),
            KVStoreError::CorruptionError { message } => {
                write!(f, "KV store corruption: {}", message)
            }
        }
    }
}

impl std::error::Error for KVStoreError {}

impl From<KVStoreError> for StoreError {
    fn from(err: KVStoreError) -> Self {
        match err {
            KVStoreError::IOError { message } => StoreError::Unavailable(message),
            KVStoreError::CorruptionError { message } => StoreError::Corrupt(message),
        }
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}
