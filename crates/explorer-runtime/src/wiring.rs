//! Assembly of store, cache and service.

use anyhow::{Context, Result};
use axum::Router;
use qx_01_block_store::{BlockStore, InMemoryBlockStore, RetryingBlockStore};
use qx_02_derived_cache::InMemoryCacheClient;
use qx_03_explorer_api::{build_router, ExplorerConfig, ExplorerService};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{RuntimeConfig, StoreBackend};
use crate::seed::seeded_store;
use crate::watcher::{Refresh, TipWatcher};

/// A wired explorer: the service plus the store it reads.
pub struct Explorer {
    pub config: ExplorerConfig,
    pub service: Arc<ExplorerService>,
    /// The store behind the retry decorator.
    pub store: Arc<dyn BlockStore>,
    refresh: Option<Arc<dyn Refresh>>,
}

impl Explorer {
    /// Open the configured backend and build the service over it.
    pub fn build(config: &RuntimeConfig) -> Result<Self> {
        let (store, refresh) = open_backend(&config.backend)?;
        let mut explorer = Self::over_store(&config.explorer, store)?;
        explorer.refresh = refresh;
        Ok(explorer)
    }

    /// Build over an already open store.
    pub fn over_store(config: &ExplorerConfig, store: Arc<dyn BlockStore>) -> Result<Self> {
        let store: Arc<dyn BlockStore> = Arc::new(RetryingBlockStore::new(
            store,
            config.store.retry_policy(),
        ));
        let service = ExplorerService::new(
            config,
            Arc::clone(&store),
            Arc::new(InMemoryCacheClient::new()),
        )
        .context("failed to build explorer service")?;

        Ok(Self {
            config: config.clone(),
            service: Arc::new(service),
            store,
            refresh: None,
        })
    }

    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.service), &self.config.http)
    }

    pub fn tip_watcher(&self, interval: Duration) -> TipWatcher {
        let watcher = TipWatcher::new(Arc::clone(&self.store), Arc::clone(&self.service), interval);
        match &self.refresh {
            Some(refresh) => watcher.with_refresh(Arc::clone(refresh)),
            None => watcher,
        }
    }
}

type OpenedBackend = (Arc<dyn BlockStore>, Option<Arc<dyn Refresh>>);

fn open_backend(backend: &StoreBackend) -> Result<OpenedBackend> {
    match backend {
        StoreBackend::Memory { seed_file: None } => {
            info!("Using empty in-memory block store");
            let store: Arc<dyn BlockStore> = Arc::new(InMemoryBlockStore::new());
            Ok((store, None))
        }
        StoreBackend::Memory {
            seed_file: Some(path),
        } => {
            let store: Arc<dyn BlockStore> = Arc::new(seeded_store(path)?);
            Ok((store, None))
        }
        #[cfg(feature = "rocksdb")]
        StoreBackend::RocksDb {
            primary_path,
            secondary_path,
        } => {
            use crate::adapters::{RocksDbConfig, RocksDbStore};
            use qx_01_block_store::KvBlockStore;

            let kv = Arc::new(
                RocksDbStore::open_secondary(&RocksDbConfig::new(primary_path, secondary_path))
                    .context("failed to open block database")?,
            );
            let refresh: Arc<dyn Refresh> = kv.clone();
            let store: Arc<dyn BlockStore> = Arc::new(KvBlockStore::from_shared(kv));
            Ok((store, Some(refresh)))
        }
        #[cfg(not(feature = "rocksdb"))]
        StoreBackend::RocksDb { .. } => {
            anyhow::bail!("EXPLORER_STORE=rocksdb requires building with the `rocksdb` feature")
        }
    }
}
