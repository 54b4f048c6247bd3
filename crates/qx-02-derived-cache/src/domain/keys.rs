//! Names of the derived values kept in the cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A derived value that can be recomputed from the block store at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedKey {
    /// `max(height)` over all blocks.
    LatestBlockHeight,
    /// Header of the block at `LatestBlockHeight`.
    LatestBlock,
    /// Sum of subsidy over all blocks, in minor units.
    TotalEmission,
    /// Headers in the charting window below the tip.
    GraphData,
}

impl DerivedKey {
    pub const ALL: [DerivedKey; 4] = [
        DerivedKey::LatestBlockHeight,
        DerivedKey::LatestBlock,
        DerivedKey::TotalEmission,
        DerivedKey::GraphData,
    ];

    /// The cache key string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedKey::LatestBlockHeight => "latest_block_height",
            DerivedKey::LatestBlock => "latest_block",
            DerivedKey::TotalEmission => "total_emission",
            DerivedKey::GraphData => "graph_data",
        }
    }
}

impl fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
