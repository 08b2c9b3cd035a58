//! Artifact storage keyed by stored filename
//!
//! The store owns the storage root and all path resolution. Callers only ever
//! pass logical keys such as `acme_invoice_2024-01-05.json`; the store has no
//! opinion about overwrite policy and performs no locking of its own.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use globset::Glob;
use tokio::fs;
use tokio_stream::wrappers::ReadDirStream;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Lazy, single-pass sequence of candidate keys
pub type KeyStream = BoxStream<'static, Result<String>>;

/// Key-value storage of whole artifacts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Replace the artifact under `key` with `bytes`, creating it if absent
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the artifact; a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Enumerate keys matching `pattern` (glob syntax). The filter is coarse:
    /// consumers must re-check every key they receive.
    async fn enumerate(&self, pattern: &str) -> Result<KeyStream>;
}

/// Filesystem backend: one file per artifact directly under the root
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create the storage root if needed and check that it accepts writes
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::io(
                format!("Could not initialize storage at {}", root.display()),
                e,
            )
        })?;

        let probe = root.join(format!(".write-probe-{}", Uuid::new_v4()));
        fs::write(&probe, b"probe").await.map_err(|e| {
            StoreError::io(
                format!("Storage directory {} is not writable", root.display()),
                e,
            )
        })?;
        if let Err(e) = fs::remove_file(&probe).await {
            debug!(probe = %probe.display(), error = %e, "could not remove write probe");
        }

        debug!(root = %root.display(), "storage initialized");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical key onto a path inside the root
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
            || key.contains('\0')
        {
            return Err(StoreError::validation(format!(
                "Invalid storage key: {:?}",
                key
            )));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(format!("Could not check file: {}", key), e))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        // the staging name must not grow with the key
        let staging = self.root.join(format!(".{}.tmp", Uuid::new_v4()));

        fs::write(&staging, bytes)
            .await
            .map_err(|e| StoreError::io(format!("Failed to store file {}", key), e))?;

        if let Err(e) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StoreError::io(format!("Failed to store file {}", key), e));
        }

        debug!(key, size = bytes.len(), "artifact written");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        fs::read(&path)
            .await
            .map_err(|e| StoreError::io(format!("Could not read file: {}", key), e))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "artifact deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(format!("Could not delete file: {}", key), e)),
        }
    }

    async fn enumerate(&self, pattern: &str) -> Result<KeyStream> {
        let matcher = Glob::new(pattern)
            .map_err(|e| {
                StoreError::validation(format!("Invalid search pattern '{}': {}", pattern, e))
            })?
            .compile_matcher();

        let read_dir = fs::read_dir(&self.root).await.map_err(|e| {
            StoreError::io(
                format!("Failed to find files with pattern: {}", pattern),
                e,
            )
        })?;

        let keys = ReadDirStream::new(read_dir).filter_map(move |entry| {
            let matcher = matcher.clone();
            async move {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(StoreError::io("Error reading storage directory", e)));
                    }
                };

                let is_file = entry
                    .file_type()
                    .await
                    .map(|file_type| file_type.is_file())
                    .unwrap_or(false);
                let name = entry.file_name().into_string().ok()?;

                (is_file && matcher.is_match(&name)).then_some(Ok(name))
            }
        });

        Ok(keys.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::TryStreamExt;
    use std::collections::HashSet;
    use tempfile::TempDir;

    async fn store() -> (TempDir, FsArtifactStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::init(temp_dir.path().join("files"))
            .await
            .unwrap();
        (temp_dir, store)
    }

    async fn collect(store: &FsArtifactStore, pattern: &str) -> HashSet<String> {
        store
            .enumerate(pattern)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_creates_nested_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("a/b/c");

        let store = FsArtifactStore::init(&root).await.unwrap();

        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
        // the write probe is cleaned up
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_init_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("occupied");
        fs::write(&root, "not a directory").await.unwrap();

        let err = FsArtifactStore::init(&root).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_write_read_exists_delete() {
        let (_temp, store) = store().await;
        let key = "acme_invoice_2024-01-05.json";

        assert!(!store.exists(key).await.unwrap());

        store.write(key, b"{}").await.unwrap();
        assert!(store.exists(key).await.unwrap());
        assert_eq!(store.read(key).await.unwrap(), b"{}");

        store.delete(key).await.unwrap();
        assert!(!store.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn test_write_overwrites_without_leftovers() {
        let (_temp, store) = store().await;
        let key = "acme_invoice_2024-01-05.json";

        store.write(key, b"first version, longer").await.unwrap();
        store.write(key, b"second").await.unwrap();

        assert_eq!(store.read(key).await.unwrap(), b"second");
        let names: Vec<_> = std::fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![key.to_string()]);
    }

    #[tokio::test]
    async fn test_write_accepts_long_keys() {
        let (_temp, store) = store().await;
        let key = format!("{}_a_2024-01-05.json", "c".repeat(232));
        assert_eq!(key.len(), 250);

        store.write(&key, b"{}").await.unwrap();

        assert_eq!(store.read(&key).await.unwrap(), b"{}");
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_read_missing_key_is_io_error() {
        let (_temp, store) = store().await;
        let err = store.read("missing_doc_2024-01-01.json").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_temp, store) = store().await;
        store.delete("never_written_2024-01-01.json").await.unwrap();
        store.delete("never_written_2024-01-01.json").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_root() {
        let (_temp, store) = store().await;

        for key in ["", ".", "..", "../escape.json", "nested/doc.json", "a\\b.json"] {
            let err = store.write(key, b"x").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{key:?}");
            assert_eq!(store.exists(key).await.unwrap_err().kind(), ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_enumerate_filters_by_glob() {
        let (_temp, store) = store().await;
        for key in [
            "acme_invoice_2024-01-05.json",
            "acme_receipt_2024-01-06.json",
            "other_invoice_2024-01-05.json",
        ] {
            store.write(key, b"{}").await.unwrap();
        }
        fs::create_dir(store.root().join("acme_dir_2024-01-05.json"))
            .await
            .unwrap();

        let acme = collect(&store, "acme_*.json").await;
        assert_eq!(
            acme,
            HashSet::from([
                "acme_invoice_2024-01-05.json".to_string(),
                "acme_receipt_2024-01-06.json".to_string(),
            ])
        );

        let dated = collect(&store, "*_2024-01-05.json").await;
        assert_eq!(dated.len(), 2);
        assert!(!dated.contains("acme_dir_2024-01-05.json"));
    }

    #[tokio::test]
    async fn test_enumerate_is_restartable() {
        let (_temp, store) = store().await;
        store.write("a_b_2024-01-01.json", b"{}").await.unwrap();

        let first = collect(&store, "*.json").await;
        let second = collect(&store, "*.json").await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[tokio::test]
    async fn test_enumerate_missing_root_is_io_error() {
        let (_temp, store) = store().await;
        fs::remove_dir_all(store.root()).await.unwrap();

        let err = store.enumerate("*.json").await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
