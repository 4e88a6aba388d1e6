//! Upload storage
//!
//! Uploaded EPUBs are kept as opaque files keyed by a generated identifier.
//! The EPUB code only ever reads them back through [`UploadStore::resolve`].

mod local;
mod types;

use std::path::PathBuf;

use async_trait::async_trait;

pub use local::LocalUploadStore;
pub use types::{StorageError, StoredFile};

/// Storage backend for uploaded documents
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Persist `data` under a fresh identifier. Never overwrites.
    async fn save(&self, data: &[u8]) -> Result<StoredFile, StorageError>;

    /// Path of a previously stored file
    async fn resolve(&self, file_id: &str) -> Result<PathBuf, StorageError>;

    /// Remove one stored file
    async fn delete(&self, file_id: &str) -> Result<(), StorageError>;

    /// Remove every stored file, returning how many were deleted
    async fn purge(&self) -> Result<usize, StorageError>;
}
