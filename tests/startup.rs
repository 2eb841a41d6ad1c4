//! Startup failure handling.

use std::sync::Arc;

use host_router::lifecycle::StartupError;
use host_router::routing::RouteRecord;
use host_router::store::{RouteStore, StoreError, StoredRoute};
use host_router::Application;

mod common;

/// A store that cannot be reached at all.
struct DownStore;

impl RouteStore for DownStore {
    fn list(&self) -> Result<Vec<StoredRoute>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn get(&self, _: &str) -> Result<Option<StoredRoute>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn create(&self, _: RouteRecord) -> Result<StoredRoute, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn update(&self, _: &str, _: RouteRecord) -> Result<Option<StoredRoute>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    fn delete(&self, _: &str) -> Result<Option<StoredRoute>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn test_unreachable_store_is_fatal_at_startup() {
    let result = Application::build_with_store(common::test_config(), Arc::new(DownStore)).await;
    assert!(matches!(result, Err(StartupError::InitialSync(_))));
}

#[tokio::test]
async fn test_corrupt_store_file_is_fatal_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.json");
    std::fs::write(&path, "[{ broken").unwrap();

    let mut config = common::test_config();
    config.store.path = path.to_string_lossy().into_owned();

    let result = Application::build(config).await;
    assert!(matches!(result, Err(StartupError::Store(StoreError::Serde(_)))));
}

#[tokio::test]
async fn test_in_memory_store_starts_empty() {
    let app = Application::build(common::test_config()).await.unwrap();
    assert!(app.control().dispatcher().current().is_empty());
    assert_ne!(app.local_addr().unwrap().port(), 0);
}
