//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the route store and install the initial routing table
//! - Start background tasks (metrics, store follower)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: a store that cannot be opened or listed is fatal here,
//!   while the same failure on a later reload only keeps the old table
//! - Listener binds last (traffic only when routes are loaded)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::ControlPlane;
use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{Dispatcher, TableBuilder};
use crate::store::{JsonFileStore, RouteStore, StoreError, StoreWatcher};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open route store: {0}")]
    Store(#[source] StoreError),

    #[error("failed to load initial routes: {0}")]
    InitialSync(#[source] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to watch route store: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Open the configured store: a JSON file, or memory when no path is set.
pub fn open_store(config: &ProxyConfig) -> Result<Arc<dyn RouteStore>, StartupError> {
    match config.store.file() {
        Some(path) => Ok(Arc::new(JsonFileStore::open(path).map_err(StartupError::Store)?)),
        None => {
            tracing::warn!("No store path configured, routes live in memory only");
            Ok(Arc::new(JsonFileStore::in_memory()))
        }
    }
}

/// A fully initialized router, bound but not yet serving.
pub struct Application {
    config: ProxyConfig,
    control: Arc<ControlPlane>,
    listener: TcpListener,
}

impl Application {
    /// Open the store from config, load routes and bind.
    pub async fn build(config: ProxyConfig) -> Result<Self, StartupError> {
        let store = open_store(&config)?;
        Self::build_with_store(config, store).await
    }

    /// Like [`Application::build`] with a store supplied by the caller.
    pub async fn build_with_store(
        config: ProxyConfig,
        store: Arc<dyn RouteStore>,
    ) -> Result<Self, StartupError> {
        let builder =
            TableBuilder::with_timeouts(config.timeouts.connect(), config.timeouts.upstream());
        let dispatcher = Arc::new(Dispatcher::new(builder));
        let control = Arc::new(ControlPlane::new(store, dispatcher));

        let version = control.sync().await.map_err(StartupError::InitialSync)?;
        tracing::info!(
            version,
            routes = control.dispatcher().current().len(),
            "Initial routing table loaded"
        );

        let listener = TcpListener::bind(&config.listener.bind_address)
            .await
            .map_err(|source| StartupError::Bind {
                address: config.listener.bind_address.clone(),
                source,
            })?;

        Ok(Self {
            config,
            control,
            listener,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    pub fn control(&self) -> &Arc<ControlPlane> {
        &self.control
    }

    /// Serve until `shutdown` fires.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let obs = &self.config.observability;
        if obs.metrics_enabled {
            // Address was checked by config validation.
            match obs.metrics_address.parse() {
                Ok(addr) => metrics::init_metrics(addr)?,
                Err(_) => tracing::error!(
                    metrics_address = %obs.metrics_address,
                    "Failed to parse metrics address"
                ),
            }
        }

        // Held for the server's lifetime; dropping it stops the watch.
        let _watcher = match (self.config.store.watch, self.config.store.file()) {
            (true, Some(path)) => {
                let (watcher, changes) = StoreWatcher::new(&path);
                let handle = watcher.run()?;
                tokio::spawn(
                    self.control
                        .clone()
                        .follow_changes(changes, shutdown.signal()),
                );
                Some(handle)
            }
            _ => None,
        };

        let server = HttpServer::new(self.config, self.control);
        server
            .run(self.listener, shutdown.signal())
            .await
            .map_err(StartupError::Serve)
    }
}
