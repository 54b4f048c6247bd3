//! Key-value record layout shared with the ingester.
//!
//! | Prefix | Key suffix | Value |
//! |--------|------------|-------|
//! | `b:` | block id (u64 BE) | bincode `Block` |
//! | `h:` | height (u64 BE) | block id (u64 BE) |
//! | `i:` | block hash (UTF-8) | block id (u64 BE) |
//! | `k:` | kernel id (UTF-8) | bincode `Kernel` |
//!
//! Big-endian integers keep `h:` keys in height order, so a range scan over
//! `h:` yields blocks in ascending height and the last key is the tip.

use shared_types::{Block, BlockId, Kernel};

use super::errors::{StoreError, StoreResult};

/// Key prefixes for the different record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    Block,
    BlockByHeight,
    BlockByHash,
    Kernel,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Block => b"b:",
            KeyPrefix::BlockByHeight => b"h:",
            KeyPrefix::BlockByHash => b"i:",
            KeyPrefix::Kernel => b"k:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    pub fn block_key(id: BlockId) -> Vec<u8> {
        KeyPrefix::Block.key(&id.0.to_be_bytes())
    }

    pub fn height_key(height: u64) -> Vec<u8> {
        KeyPrefix::BlockByHeight.key(&height.to_be_bytes())
    }

    pub fn hash_key(hash: &str) -> Vec<u8> {
        KeyPrefix::BlockByHash.key(hash.as_bytes())
    }

    pub fn kernel_key(kernel_id: &str) -> Vec<u8> {
        KeyPrefix::Kernel.key(kernel_id.as_bytes())
    }
}

/// Decode a block id stored as an index value.
pub fn decode_block_id(bytes: &[u8]) -> StoreResult<BlockId> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Codec(format!("block id must be 8 bytes, got {}", bytes.len())))?;
    Ok(BlockId(u64::from_be_bytes(raw)))
}

pub fn decode_block(bytes: &[u8]) -> StoreResult<Block> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn decode_kernel(bytes: &[u8]) -> StoreResult<Kernel> {
    Ok(bincode::deserialize(bytes)?)
}

/// Every key-value pair the ingester writes for one block.
pub fn block_entries(block: &Block) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let id = block.id.0.to_be_bytes().to_vec();
    let mut entries = vec![
        (KeyPrefix::block_key(block.id), bincode::serialize(block)?),
        (KeyPrefix::height_key(block.height), id.clone()),
        (KeyPrefix::hash_key(&block.hash), id),
    ];
    for kernel in &block.kernels {
        entries.push((
            KeyPrefix::kernel_key(&kernel.kernel_id),
            bincode::serialize(kernel)?,
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_keys_sort_numerically() {
        let mut keys = vec![
            KeyPrefix::height_key(256),
            KeyPrefix::height_key(3),
            KeyPrefix::height_key(70_000),
        ];
        keys.sort();
        assert_eq!(keys[0], KeyPrefix::height_key(3));
        assert_eq!(keys[2], KeyPrefix::height_key(70_000));
    }

    #[test]
    fn test_decode_block_id_rejects_short_value() {
        assert!(matches!(decode_block_id(&[1, 2, 3]), Err(StoreError::Codec(_))));
        assert_eq!(decode_block_id(&7u64.to_be_bytes()).unwrap(), BlockId(7));
    }
}
