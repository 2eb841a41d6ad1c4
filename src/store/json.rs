//! JSON-file backed route store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Deserialize;
use uuid::Uuid;

use crate::routing::RouteRecord;
use crate::store::{check_record, RouteStore, StoreError, StoredRoute};

/// On-disk entry. Hand-written files may omit the id.
#[derive(Deserialize)]
struct FileEntry {
    id: Option<String>,
    #[serde(flatten)]
    record: RouteRecord,
}

/// Ordered route list kept in memory and mirrored to a JSON file.
///
/// Every mutation is written to disk before it becomes visible; a failed
/// write leaves the store unchanged.
pub struct JsonFileStore {
    path: Option<PathBuf>,
    routes: RwLock<Vec<StoredRoute>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let routes = read_file(&path)?;
        tracing::info!(path = %path.display(), routes = routes.len(), "Route store opened");
        Ok(Self {
            path: Some(path),
            routes: RwLock::new(routes),
        })
    }

    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            routes: RwLock::new(Vec::new()),
        }
    }

    /// In-memory store seeded with `records`.
    pub fn with_records(records: impl IntoIterator<Item = RouteRecord>) -> Self {
        let routes = records.into_iter().map(new_route).collect();
        Self {
            path: None,
            routes: RwLock::new(routes),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<StoredRoute>>, StoreError> {
        self.routes
            .read()
            .map_err(|_| StoreError::Unavailable("route store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredRoute>>, StoreError> {
        self.routes
            .write()
            .map_err(|_| StoreError::Unavailable("route store lock poisoned".into()))
    }

    /// Persist `next` and, only if that worked, make it current.
    fn commit(
        &self,
        guard: &mut RwLockWriteGuard<'_, Vec<StoredRoute>>,
        next: Vec<StoredRoute>,
    ) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            write_file(path, &next)?;
        }
        **guard = next;
        Ok(())
    }
}

impl RouteStore for JsonFileStore {
    fn list(&self) -> Result<Vec<StoredRoute>, StoreError> {
        let routes = self.read()?.clone();
        tracing::debug!(count = routes.len(), "Listing routes");
        Ok(routes)
    }

    fn get(&self, id: &str) -> Result<Option<StoredRoute>, StoreError> {
        Ok(self.read()?.iter().find(|r| r.id == id).cloned())
    }

    fn create(&self, record: RouteRecord) -> Result<StoredRoute, StoreError> {
        check_record(&record)?;
        let mut guard = self.write()?;
        if guard.iter().any(|r| r.record.domain == record.domain) {
            return Err(StoreError::DuplicateDomain(record.domain));
        }

        let route = new_route(record);
        let mut next = guard.clone();
        next.push(route.clone());
        self.commit(&mut guard, next)?;

        tracing::info!(id = %route.id, domain = %route.record.domain, "Route created");
        Ok(route)
    }

    fn update(&self, id: &str, record: RouteRecord) -> Result<Option<StoredRoute>, StoreError> {
        check_record(&record)?;
        let mut guard = self.write()?;
        let Some(pos) = guard.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        if guard
            .iter()
            .any(|r| r.id != id && r.record.domain == record.domain)
        {
            return Err(StoreError::DuplicateDomain(record.domain));
        }

        let route = StoredRoute {
            id: id.to_string(),
            record,
        };
        let mut next = guard.clone();
        next[pos] = route.clone();
        self.commit(&mut guard, next)?;

        tracing::info!(id = %id, domain = %route.record.domain, "Route updated");
        Ok(Some(route))
    }

    fn delete(&self, id: &str) -> Result<Option<StoredRoute>, StoreError> {
        let mut guard = self.write()?;
        let Some(pos) = guard.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let mut next = guard.clone();
        let removed = next.remove(pos);
        self.commit(&mut guard, next)?;

        tracing::info!(id = %id, domain = %removed.record.domain, "Route deleted");
        Ok(Some(removed))
    }

    fn reload(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        // Read under the write lock: a mutation is either on disk already
        // or waits for this reload.
        let mut guard = self.write()?;
        let routes = read_file(path)?;
        tracing::info!(path = %path.display(), routes = routes.len(), "Route store reloaded");
        *guard = routes;
        Ok(())
    }
}

fn new_route(record: RouteRecord) -> StoredRoute {
    StoredRoute {
        id: Uuid::new_v4().to_string(),
        record,
    }
}

fn read_file(path: &Path) -> Result<Vec<StoredRoute>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<FileEntry> = serde_json::from_str(&content)?;
    Ok(entries
        .into_iter()
        .map(|e| match e.id {
            Some(id) => StoredRoute { id, record: e.record },
            None => new_route(e.record),
        })
        .collect())
}

fn write_file(path: &Path, routes: &[StoredRoute]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(routes)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
