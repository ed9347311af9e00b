use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use cachewarmer_core::{Config, DedupStats, DedupStore, SanitizedConfig, WarmerStatus};

/// Shared application state
pub struct AppState {
    config: Config,
    status: Arc<RwLock<WarmerStatus>>,
    store: Arc<dyn DedupStore>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        status: Arc<RwLock<WarmerStatus>>,
        store: Arc<dyn DedupStore>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            status,
            store,
            shutdown,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub async fn status(&self) -> WarmerStatus {
        self.status.read().await.clone()
    }

    /// Dedup row counts, or `None` when the store cannot be read.
    pub fn dedup_stats(&self) -> Option<DedupStats> {
        match self.store.stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read dedup stats");
                None
            }
        }
    }

    /// Request a graceful stop of the scheduler and the server.
    pub fn request_stop(&self) -> bool {
        let already = self.shutdown.is_cancelled();
        self.shutdown.cancel();
        !already
    }

    pub fn stop_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
