//! JSON block fixtures for the in-memory backend.
//!
//! The file holds a JSON array of blocks in the same shape the HTTP API
//! returns. Blocks may appear in any order; they are appended by height.

use anyhow::{Context, Result};
use qx_01_block_store::InMemoryBlockStore;
use shared_types::Block;
use std::path::Path;
use tracing::info;

pub fn load_seed_blocks(path: &Path) -> Result<Vec<Block>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let mut blocks: Vec<Block> = serde_json::from_str(&text)
        .with_context(|| format!("invalid seed file {}", path.display()))?;
    blocks.sort_by_key(|b| b.height);
    Ok(blocks)
}

/// An in-memory store holding the blocks from `path`.
pub fn seeded_store(path: &Path) -> Result<InMemoryBlockStore> {
    let blocks = load_seed_blocks(path)?;
    let count = blocks.len();
    let store = InMemoryBlockStore::with_blocks(blocks)
        .with_context(|| format!("seed file {} is not a valid chain", path.display()))?;
    info!(blocks = count, path = %path.display(), "Loaded seed blocks");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qx_01_block_store::test_utils::{fixture_blocks, make_block};
    use qx_01_block_store::BlockStore;
    use std::io::Write;

    fn seed_file(blocks: &[Block]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(blocks).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[tokio::test]
    async fn test_unordered_seed_is_appended_by_height() {
        let mut blocks = fixture_blocks();
        blocks.reverse();
        let file = seed_file(&blocks);

        let store = seeded_store(file.path()).unwrap();
        assert_eq!(store.len(), 6);
        assert_eq!(store.get_latest_by_height().await.unwrap().unwrap().height, 105);
    }

    #[test]
    fn test_duplicate_height_is_rejected() {
        let file = seed_file(&[make_block(100, 0), make_block(100, 1)]);
        assert!(seeded_store(file.path()).is_err());
    }

    #[test]
    fn test_malformed_seed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"not\": \"a list\"}").unwrap();
        assert!(load_seed_blocks(file.path()).is_err());
    }
}
