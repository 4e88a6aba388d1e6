//! Local filesystem upload store
//!
//! Files live directly in the upload directory as `{uuid}.epub`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::types::{StorageError, StoredFile};
use super::UploadStore;

const EXTENSION: &str = "epub";

/// Attempts at finding an unused identifier before giving up
const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct LocalUploadStore {
    root: PathBuf,
}

impl LocalUploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &Uuid) -> PathBuf {
        self.root.join(format!("{}.{}", id, EXTENSION))
    }

    async fn create_new(&self) -> Result<(Uuid, PathBuf, fs::File), StorageError> {
        fs::create_dir_all(&self.root).await?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = Uuid::new_v4();
            let path = self.path_for(&id);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((id, path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::warn!(file_id = %id, "Upload id collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not allocate a unique upload id",
        )))
    }
}

/// Only canonical UUIDs map to files, which also rules out path traversal
fn parse_id(file_id: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(file_id).map_err(|_| StorageError::InvalidId(file_id.to_string()))
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn save(&self, data: &[u8]) -> Result<StoredFile, StorageError> {
        let (id, path, mut file) = self.create_new().await?;

        let written = async {
            file.write_all(data).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        tracing::info!(file_id = %id, size = data.len(), "Stored upload");

        Ok(StoredFile {
            id,
            path,
            size: data.len(),
        })
    }

    async fn resolve(&self, file_id: &str) -> Result<PathBuf, StorageError> {
        let id = parse_id(file_id)?;
        let path = self.path_for(&id);

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::NotFound(file_id.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(file_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, file_id: &str) -> Result<(), StorageError> {
        let path = self.resolve(file_id).await?;
        fs::remove_file(&path).await?;
        tracing::info!(file_id = %file_id, "Deleted upload");
        Ok(())
    }

    async fn purge(&self) -> Result<usize, StorageError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_upload = path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION)
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| Uuid::parse_str(stem).is_ok());

            if is_upload {
                fs::remove_file(&path).await?;
                removed += 1;
            }
        }

        tracing::info!(removed, dir = %self.root.display(), "Purged uploads");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_resolve() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalUploadStore::new(temp_dir.path().join("uploads"));

        let stored = store.save(b"epub bytes").await.unwrap();
        assert_eq!(stored.size, 10);

        let path = store.resolve(&stored.id.to_string()).await.unwrap();
        assert_eq!(path, stored.path);
        assert_eq!(std::fs::read(&path).unwrap(), b"epub bytes");
    }

    #[tokio::test]
    async fn test_save_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalUploadStore::new(temp_dir.path());

        let first = store.save(b"first").await.unwrap();
        let second = store.save(b"second").await.unwrap();
        assert_ne!(first.id, second.id);

        let first_path = store.resolve(&first.id.to_string()).await.unwrap();
        assert_eq!(std::fs::read(first_path).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_resolve_unknown_and_invalid_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalUploadStore::new(temp_dir.path());

        let unknown = Uuid::new_v4().to_string();
        assert!(matches!(
            store.resolve(&unknown).await,
            Err(StorageError::NotFound(_))
        ));

        for bad in ["../etc/passwd", "", "not-a-uuid", "abc.epub"] {
            assert!(matches!(
                store.resolve(bad).await,
                Err(StorageError::InvalidId(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalUploadStore::new(temp_dir.path());

        let stored = store.save(b"bytes").await.unwrap();
        let id = stored.id.to_string();

        store.delete(&id).await.unwrap();
        assert!(!stored.path.exists());
        assert!(matches!(
            store.delete(&id).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_only_removes_uploads() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalUploadStore::new(temp_dir.path());

        store.save(b"one").await.unwrap();
        store.save(b"two").await.unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(store.purge().await.unwrap(), 2);
        assert!(temp_dir.path().join("notes.txt").exists());

        let missing = LocalUploadStore::new(temp_dir.path().join("never-created"));
        assert_eq!(missing.purge().await.unwrap(), 0);
    }
}
