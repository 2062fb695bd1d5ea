//! Persistence boundary
//!
//! Construction strategies hand finished objects to an [`ObjectStore`]. The
//! filesystem store writes one directory per object, the dry-run store counts
//! and drops them, and the in-memory store keeps them for tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{PersistedRef, WorkObject};

/// File name of the serialized object inside its directory
pub const OBJECT_FILE: &str = "object.json";

/// Directory holding copies of attached files inside an object directory
pub const FILES_DIR: &str = "files";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize object: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sink for constructed objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Persist one object, taking ownership of it
    async fn persist(&self, object: WorkObject) -> Result<PersistedRef, StoreError>;
}

/// Stores objects as `<root>/<model>/<id>/object.json` plus copied files
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory an object is (or would be) written to
    pub fn object_dir(&self, object: &WorkObject) -> PathBuf {
        self.root
            .join(object.model.to_lowercase())
            .join(object.id.to_string())
    }

    async fn write_object(&self, dir: &Path, object: &WorkObject) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(dir).await.map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for file in &object.files {
            let target = dir.join(FILES_DIR).join(&file.name);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            tokio::fs::copy(&file.source, &target)
                .await
                .map_err(|source| StoreError::Io {
                    path: target.clone(),
                    source,
                })?;
            debug!(file = %file.name, target = %target.display(), "Copied attached file");
        }

        let json = serde_json::to_vec_pretty(object)?;
        let object_path = dir.join(OBJECT_FILE);
        tokio::fs::write(&object_path, json)
            .await
            .map_err(|source| StoreError::Io {
                path: object_path,
                source,
            })
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn persist(&self, object: WorkObject) -> Result<PersistedRef, StoreError> {
        let dir = self.object_dir(&object);

        if let Err(e) = self.write_object(&dir, &object).await {
            // leave no half-written object behind
            if let Err(cleanup) = tokio::fs::remove_dir_all(&dir).await {
                warn!(dir = %dir.display(), error = %cleanup, "Failed to clean up partial object");
            }
            return Err(e);
        }

        Ok(PersistedRef {
            id: object.id,
            model: object.model,
            location: dir.display().to_string(),
        })
    }
}

/// Accepts objects without keeping them, for dry runs
#[derive(Debug, Default)]
pub struct DryRunStore {
    accepted: AtomicUsize,
}

impl DryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for DryRunStore {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn persist(&self, object: WorkObject) -> Result<PersistedRef, StoreError> {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        debug!(id = %object.id, model = %object.model, "Dry run, object dropped");
        Ok(PersistedRef {
            location: format!("dry-run://{}/{}", object.model.to_lowercase(), object.id),
            id: object.id,
            model: object.model,
        })
    }
}

/// Keeps objects in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: Mutex<Vec<WorkObject>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far, in persist order
    pub fn objects(&self) -> Vec<WorkObject> {
        self.objects
            .lock()
            .map(|objects| objects.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn persist(&self, object: WorkObject) -> Result<PersistedRef, StoreError> {
        let persisted = PersistedRef {
            id: object.id,
            model: object.model.clone(),
            location: format!("memory://{}/{}", object.model.to_lowercase(), object.id),
        };

        match self.objects.lock() {
            Ok(mut objects) => objects.push(object),
            Err(poisoned) => poisoned.into_inner().push(object),
        }

        Ok(persisted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::AttachedFile;
    use rdr_common::types::ChecksumAlgorithm;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_store_writes_object_and_files() {
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("data.csv");
        std::fs::write(&source, b"a,b\n1,2\n").unwrap();

        let store_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(store_dir.path());

        let mut object = WorkObject::new("Dataset", "alice");
        object.files.push(AttachedFile {
            name: "nested/data.csv".to_string(),
            source,
            size: 8,
            algorithm: ChecksumAlgorithm::Sha256,
            digest: "irrelevant".to_string(),
            verified: false,
        });
        let expected_dir = store.object_dir(&object);

        let persisted = store.persist(object.clone()).await.unwrap();
        assert_eq!(persisted.id, object.id);
        assert_eq!(persisted.location, expected_dir.display().to_string());

        let copied = std::fs::read(expected_dir.join(FILES_DIR).join("nested/data.csv")).unwrap();
        assert_eq!(copied, b"a,b\n1,2\n");

        let json = std::fs::read_to_string(expected_dir.join(OBJECT_FILE)).unwrap();
        let reloaded: WorkObject = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, object);
    }

    #[tokio::test]
    async fn test_fs_store_cleans_up_failed_object() {
        let store_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(store_dir.path());

        let mut object = WorkObject::new("Dataset", "alice");
        object.files.push(AttachedFile {
            name: "missing.csv".to_string(),
            source: store_dir.path().join("does-not-exist.csv"),
            size: 0,
            algorithm: ChecksumAlgorithm::Sha256,
            digest: String::new(),
            verified: false,
        });
        let dir = store.object_dir(&object);

        let err = store.persist(object).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_dry_run_store_counts_without_keeping() {
        let store = DryRunStore::new();
        let mut object = WorkObject::new("Dataset", "alice");
        object.files.push(AttachedFile {
            name: "data.csv".to_string(),
            source: PathBuf::from("/nowhere/data.csv"),
            size: 0,
            algorithm: ChecksumAlgorithm::Sha256,
            digest: String::new(),
            verified: false,
        });
        let id = object.id;

        let persisted = store.persist(object).await.unwrap();
        store.persist(WorkObject::new("Collection", "bob")).await.unwrap();

        assert_eq!(store.accepted(), 2);
        assert_eq!(persisted.id, id);
        assert_eq!(persisted.location, format!("dry-run://dataset/{}", id));
    }

    #[tokio::test]
    async fn test_in_memory_store_keeps_order() {
        let store = InMemoryStore::new();
        store.persist(WorkObject::new("Dataset", "a")).await.unwrap();
        let second = store.persist(WorkObject::new("Collection", "b")).await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(second.location.starts_with("memory://collection/"));
        assert_eq!(store.objects()[1].depositor, "b");
    }
}
