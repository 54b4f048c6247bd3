//! Query error taxonomy.
//!
//! Store and cache internals never leak through these variants; the HTTP
//! adapter maps each one to a status and a fixed body.

use qx_01_block_store::StoreError;
use thiserror::Error;
use tracing::{error, warn};

pub type QueryResult<T> = Result<T, QueryError>;

/// Failures visible to explorer clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Nothing matches the given key, or the key was absent/empty.
    #[error("not found")]
    NotFound,

    /// The access key did not match the configured secret.
    #[error("access denied")]
    AccessDenied,

    /// A stored reference does not resolve (e.g. a kernel's owning block).
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    /// The block store could not be reached.
    #[error("upstream unavailable")]
    UpstreamUnavailable,
}

impl QueryError {
    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            QueryError::NotFound => "not_found",
            QueryError::AccessDenied => "access_denied",
            QueryError::DataIntegrity(_) => "data_integrity",
            QueryError::UpstreamUnavailable => "upstream_unavailable",
        }
    }
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt(detail) | StoreError::Codec(detail) => {
                error!(error = %detail, "Block store returned inconsistent data");
                QueryError::DataIntegrity(detail)
            }
            other => {
                warn!(error = %other, "Block store call failed");
                QueryError::UpstreamUnavailable
            }
        }
    }
}
