//! Route store subsystem.
//!
//! # Data Flow
//! ```text
//! Control plane (RPC / CLI)
//!     → RouteStore (create / update / delete by id)
//!     → json.rs (ordered records, persisted as a JSON array)
//!     → list() snapshot → Dispatcher::update_config
//!
//! watcher.rs: external edit of the JSON file
//!     → control plane reload → list() → Dispatcher::update_config
//! ```
//!
//! # Design Decisions
//! - The store owns uniqueness of domains; the routing table does not
//! - `list()` keeps insertion order
//! - Stores are the only persistent state; routing tables never are

pub mod json;
pub mod watcher;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::RouteRecord;

pub use json::JsonFileStore;
pub use watcher::StoreWatcher;

/// A route record with its store identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredRoute {
    pub id: String,

    #[serde(flatten)]
    pub record: RouteRecord,
}

/// Errors raised by route stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("domain '{0}' is already routed")]
    DuplicateDomain(String),

    #[error("field '{0}' must not be empty")]
    MissingField(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// CRUD access to proxy routes.
pub trait RouteStore: Send + Sync {
    /// Every stored route, in insertion order.
    fn list(&self) -> Result<Vec<StoredRoute>, StoreError>;

    fn get(&self, id: &str) -> Result<Option<StoredRoute>, StoreError>;

    fn create(&self, record: RouteRecord) -> Result<StoredRoute, StoreError>;

    /// Replace the record stored under `id`. `Ok(None)` if there is none.
    fn update(&self, id: &str, record: RouteRecord) -> Result<Option<StoredRoute>, StoreError>;

    /// Remove the route stored under `id`. `Ok(None)` if there is none.
    fn delete(&self, id: &str) -> Result<Option<StoredRoute>, StoreError>;

    /// Re-read the backing source, if any.
    fn reload(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Just the records, ready for the routing table builder.
    fn records(&self) -> Result<Vec<RouteRecord>, StoreError> {
        Ok(self.list()?.into_iter().map(|r| r.record).collect())
    }
}

pub(crate) fn check_record(record: &RouteRecord) -> Result<(), StoreError> {
    if record.name.trim().is_empty() {
        return Err(StoreError::MissingField("name"));
    }
    if record.domain.trim().is_empty() {
        return Err(StoreError::MissingField("domain"));
    }
    if record.target.trim().is_empty() {
        return Err(StoreError::MissingField("proxyTo"));
    }
    Ok(())
}
