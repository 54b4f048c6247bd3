//! # Access-Gated Query
//!
//! The heaviest block (most distinct outputs + inputs + kernels), optionally
//! restricted to a trailing creation-time window. Requires a shared secret.

use qx_01_block_store::BlockStore;
use shared_types::{Block, EntityKind, TimeWindow};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::error::{QueryError, QueryResult};
use crate::ports::outbound::TimeSource;

/// The configured shared secret. No secret means every key is rejected.
#[derive(Clone, Default)]
pub struct AccessKey {
    secret: Option<String>,
}

impl AccessKey {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Exact, constant-time comparison against the secret.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.secret {
            Some(secret) => constant_time_compare(provided, secret),
            None => false,
        }
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKey")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Constant-time string comparison.
///
/// Both inputs are padded to the longer length with different bytes, so a
/// length mismatch is never equal and the comparison does not leak a prefix.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}

/// Heaviest-block lookup behind an access key.
pub struct HeaviestBlockQuery {
    store: Arc<dyn BlockStore>,
    key: AccessKey,
    clock: Arc<dyn TimeSource>,
}

impl HeaviestBlockQuery {
    pub fn new(store: Arc<dyn BlockStore>, key: AccessKey, clock: Arc<dyn TimeSource>) -> Self {
        Self { store, key, clock }
    }

    /// Block maximizing distinct outputs + inputs + kernels.
    ///
    /// With `period_hours`, only blocks created in `[now - period, now)` are
    /// considered. Ties go to the highest block. A zero period selects
    /// nothing; a period longer than all history selects every block.
    pub async fn heaviest_block(
        &self,
        provided_key: &str,
        period_hours: Option<u32>,
    ) -> QueryResult<Block> {
        if !self.key.verify(provided_key) {
            warn!(configured = self.key.is_configured(), "Rejected access key");
            return Err(QueryError::AccessDenied);
        }

        if period_hours == Some(0) {
            return Err(QueryError::NotFound);
        }

        let window = period_hours.map(|hours| TimeWindow::trailing_hours(self.clock.now(), hours));
        let counts = self
            .store
            .count_related_in_window(&EntityKind::ALL, window)
            .await?;

        let heaviest = counts
            .iter()
            .max_by_key(|c| (c.count, c.height))
            .ok_or(QueryError::NotFound)?;
        debug!(
            height = heaviest.height,
            weight = heaviest.count,
            candidates = counts.len(),
            "Selected heaviest block"
        );

        match self.store.get_by_id(heaviest.block_id).await? {
            Some(block) => Ok(block),
            None => {
                error!(block_id = %heaviest.block_id, "Counted block is missing from the store");
                Err(QueryError::DataIntegrity(format!(
                    "block {} counted but not stored",
                    heaviest.block_id
                )))
            }
        }
    }
}
