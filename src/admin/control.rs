//! Reconfiguration protocol between the route store and the dispatcher.
//!
//! # Responsibilities
//! - Turn the store's current snapshot into a live routing table
//! - Keep the live table when the store cannot be read
//! - Follow external edits of the store file
//!
//! # Design Decisions
//! - The only write path into the routing core
//! - Syncs are serialized so an older snapshot never lands after a newer one
//! - All-or-nothing: a failed read never touches the live table

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::Dispatcher;
use crate::store::{RouteStore, StoreError};

pub struct ControlPlane {
    store: Arc<dyn RouteStore>,
    dispatcher: Arc<Dispatcher>,
    sync_lock: Mutex<()>,
}

impl ControlPlane {
    pub fn new(store: Arc<dyn RouteStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            sync_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &dyn RouteStore {
        self.store.as_ref()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Push the store's current routes into the dispatcher.
    /// Returns the version of the table now live.
    pub async fn sync(&self) -> Result<u64, StoreError> {
        let _guard = self.sync_lock.lock().await;
        self.sync_locked()
    }

    /// Re-read the store's backing source, then sync.
    pub async fn reload(&self) -> Result<u64, StoreError> {
        let _guard = self.sync_lock.lock().await;
        if let Err(e) = self.store.reload() {
            tracing::error!(error = %e, "Route store reload failed, keeping current routing table");
            metrics::record_reload(false);
            return Err(e);
        }
        self.sync_locked()
    }

    fn sync_locked(&self) -> Result<u64, StoreError> {
        match self.store.records() {
            Ok(records) => {
                let version = self.dispatcher.update_config(&records);
                metrics::record_reload(true);
                Ok(version)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to list routes, keeping current routing table");
                metrics::record_reload(false);
                Err(e)
            }
        }
    }

    /// Reload on every change signal until shutdown.
    pub async fn follow_changes(
        self: Arc<Self>,
        mut changes: mpsc::UnboundedReceiver<()>,
        mut shutdown: ShutdownSignal,
    ) {
        loop {
            tokio::select! {
                change = changes.recv() => {
                    if change.is_none() {
                        break;
                    }
                    // Coalesce bursts of events from a single write.
                    while changes.try_recv().is_ok() {}
                    let _ = self.reload().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Store change follower received shutdown signal");
                    break;
                }
            }
        }
    }
}
