//! Storage types

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A file written by an [`UploadStore`](super::UploadStore)
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub id: Uuid,
    #[serde(skip)]
    pub path: PathBuf,
    pub size: usize,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file id: {0}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
