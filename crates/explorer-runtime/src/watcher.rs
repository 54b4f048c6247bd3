//! Chain tip polling.
//!
//! The ingester runs out of process, so the explorer learns about new blocks
//! by polling the tip height. A changed height evicts the derived values
//! through `ExplorerService::on_block_ingested`.

use qx_01_block_store::{BlockStore, KVStoreError};
use qx_03_explorer_api::ExplorerService;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Backends that must be told to pick up external writes.
pub trait Refresh: Send + Sync {
    fn refresh(&self) -> Result<(), KVStoreError>;
}

/// Polls the tip and invalidates cached values when it moves.
pub struct TipWatcher {
    store: Arc<dyn BlockStore>,
    service: Arc<ExplorerService>,
    refresh: Option<Arc<dyn Refresh>>,
    interval: Duration,
    last_height: Option<u64>,
}

impl TipWatcher {
    pub fn new(store: Arc<dyn BlockStore>, service: Arc<ExplorerService>, interval: Duration) -> Self {
        Self {
            store,
            service,
            refresh: None,
            interval,
            last_height: None,
        }
    }

    pub fn with_refresh(mut self, refresh: Arc<dyn Refresh>) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    /// One polling round. Returns `true` when cached values were evicted.
    pub async fn poll_once(&mut self) -> bool {
        if let Some(refresh) = &self.refresh {
            if let Err(e) = refresh.refresh() {
                warn!(error = %e, "Failed to refresh block store view");
            }
        }

        let height = match self.store.get_latest_by_height().await {
            Ok(Some(block)) => block.height,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "Failed to read chain tip");
                return false;
            }
        };

        if self.last_height == Some(height) {
            return false;
        }

        debug!(previous = ?self.last_height, height, "Chain tip moved");
        self.last_height = Some(height);
        self.service.on_block_ingested().await;
        true
    }

    /// Poll until `shutdown` resolves.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval = ?self.interval, "Chain tip watcher started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
        info!("Chain tip watcher stopped");
    }
}
