//! Runtime configuration.
//!
//! Loading order: `ExplorerConfig` defaults, then the JSON file named by
//! `EXPLORER_CONFIG`, then `EXPLORER_*` overrides.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EXPLORER_CONFIG` | unset | JSON configuration file |
//! | `EXPLORER_STORE` | `memory` | `memory` or `rocksdb` |
//! | `EXPLORER_SEED_FILE` | unset | JSON array of blocks for the memory store |
//! | `EXPLORER_DB_PATH` | `./data/rocksdb` | ingester database directory |
//! | `EXPLORER_DB_SECONDARY_PATH` | `./data/explorer-secondary` | secondary instance directory |
//! | `EXPLORER_TIP_POLL_SECS` | `5` | chain tip polling period, `0` disables |

use anyhow::{bail, Context, Result};
use qx_03_explorer_api::ExplorerConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Where blocks are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store, optionally seeded from a JSON file.
    Memory { seed_file: Option<PathBuf> },
    /// The ingester's RocksDB, opened as a read-only secondary.
    RocksDb {
        primary_path: PathBuf,
        secondary_path: PathBuf,
    },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub explorer: ExplorerConfig,
    pub backend: StoreBackend,
    /// `None` disables tip polling; cached values then only change through
    /// TTL expiry.
    pub tip_poll_interval: Option<Duration>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        Self::load(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn load<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut explorer = match lookup("EXPLORER_CONFIG") {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path))?;
                ExplorerConfig::from_json(&text)
                    .with_context(|| format!("invalid config file {}", path))?
            }
            None => ExplorerConfig::default(),
        };
        explorer.apply_env_overrides(&lookup)?;
        explorer.validate()?;

        let backend = match lookup("EXPLORER_STORE").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory {
                seed_file: lookup("EXPLORER_SEED_FILE").map(PathBuf::from),
            },
            "rocksdb" => StoreBackend::RocksDb {
                primary_path: lookup("EXPLORER_DB_PATH")
                    .unwrap_or_else(|| "./data/rocksdb".to_string())
                    .into(),
                secondary_path: lookup("EXPLORER_DB_SECONDARY_PATH")
                    .unwrap_or_else(|| "./data/explorer-secondary".to_string())
                    .into(),
            },
            other => bail!("unknown EXPLORER_STORE backend {:?}", other),
        };

        let poll_secs: u64 = match lookup("EXPLORER_TIP_POLL_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid EXPLORER_TIP_POLL_SECS {:?}", raw))?,
            None => 5,
        };

        Ok(Self {
            explorer,
            backend,
            tip_poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
        })
    }
}
