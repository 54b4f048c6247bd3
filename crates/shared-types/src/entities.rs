//! # Ledger Entities
//!
//! The records the external ingester writes and the explorer reads.
//!
//! ```text
//! Block (id, height, hash)
//!   ├── inputs[]   (block_id → Block.id)
//!   ├── outputs[]  (block_id → Block.id)
//!   └── kernels[]  (block_id → Block.id, kernel_id unique)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Store-assigned surrogate key of a block.
///
/// Kernels, inputs and outputs reference their owning block through this id,
/// not through height or hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Related entity kinds that can be counted per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Input,
    Output,
    Kernel,
}

impl EntityKind {
    /// Every kind, in the order the heaviest-block weight sums them.
    pub const ALL: [EntityKind; 3] = [EntityKind::Output, EntityKind::Input, EntityKind::Kernel];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Input => "input",
            EntityKind::Output => "output",
            EntityKind::Kernel => "kernel",
        }
    }
}

/// A transaction kernel, owned by exactly one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kernel {
    /// Row id.
    pub id: u64,
    /// Public kernel identifier (unique).
    pub kernel_id: String,
    /// Owning block.
    pub block_id: BlockId,
    /// Fee paid, in minor units.
    pub fee: u64,
    /// Kernel excess commitment (hex).
    pub excess: String,
}

/// A spent commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub id: u64,
    pub commitment: String,
    pub block_id: BlockId,
}

/// A created commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub id: u64,
    pub commitment: String,
    pub output_type: OutputType,
    pub block_id: BlockId,
}

/// Output features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    #[default]
    Transaction,
    Coinbase,
}

/// A full block record as stored by the ingester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Store surrogate key.
    pub id: BlockId,
    /// Height in the chain (unique, strictly increasing).
    pub height: u64,
    /// Block hash (unique).
    pub hash: String,
    /// Newly minted amount at this block, in minor units.
    pub subsidy: u64,
    /// When the block was produced.
    pub created_at: DateTime<Utc>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub kernels: Vec<Kernel>,
}

impl Block {
    /// Project this block onto the lightweight header used for charting.
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            height: self.height,
            hash: self.hash.clone(),
            subsidy: self.subsidy,
            created_at: self.created_at,
            input_count: self.distinct_count(EntityKind::Input),
            output_count: self.distinct_count(EntityKind::Output),
            kernel_count: self.distinct_count(EntityKind::Kernel),
        }
    }

    /// Count related entities of one kind, deduplicated by row id.
    pub fn distinct_count(&self, kind: EntityKind) -> u64 {
        let ids: HashSet<u64> = match kind {
            EntityKind::Input => self.inputs.iter().map(|i| i.id).collect(),
            EntityKind::Output => self.outputs.iter().map(|o| o.id).collect(),
            EntityKind::Kernel => self.kernels.iter().map(|k| k.id).collect(),
        };
        ids.len() as u64
    }

    /// Sum of distinct related counts over the given kinds.
    pub fn weight(&self, kinds: &[EntityKind]) -> u64 {
        kinds.iter().map(|kind| self.distinct_count(*kind)).sum()
    }
}

/// Header projection of a block.
///
/// This is what `latest_block` and the charting window carry; the full
/// input/output/kernel lists are only returned for single-block lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub hash: String,
    pub subsidy: u64,
    pub created_at: DateTime<Utc>,
    pub input_count: u64,
    pub output_count: u64,
    pub kernel_count: u64,
}

/// Per-block related-entity count, as produced by the store's windowed
/// aggregate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedCount {
    pub block_id: BlockId,
    pub height: u64,
    pub count: u64,
}
