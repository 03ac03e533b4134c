//! Configuration file watcher for hot reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::error::StoreError;
use crate::config::store::ConfigStore;

/// Watches the store's persistence file and reloads the store when it changes.
///
/// Reloads use [`ConfigStore::reload`], so a broken edit keeps the previous
/// configuration in memory.
pub struct ConfigWatcher {
    store: Arc<ConfigStore>,
}

impl ConfigWatcher {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, StoreError> {
        let path: PathBuf = self
            .store
            .persistence()
            .ok_or(StoreError::NoPersistenceTarget)?
            .path()
            .to_path_buf();
        let store = self.store;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        // Failures are logged by reload.
                        let _ = store.reload();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
