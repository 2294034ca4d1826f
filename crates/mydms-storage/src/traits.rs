//! Storage abstraction trait
//!
//! This module defines the Storage trait that all object store backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A file handed to the object store
#[derive(Debug, Clone)]
pub struct FileItem {
    pub file_name: String,
    /// Folder the file is placed in, e.g. `2024_01_31`
    pub folder_name: String,
    pub mime_type: String,
    pub payload: Bytes,
}

/// A file read back from the object store
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub mime_type: String,
    pub payload: Bytes,
}

/// Object store abstraction
///
/// **Key format:** `<folder>/<file_name>` without a leading `/`. See the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store the file under `<folder>/<file_name>`, overwriting an existing object.
    /// Returns the key.
    async fn save(&self, file: FileItem) -> StorageResult<String>;

    /// Payload and mime type of the object at `key`
    async fn get(&self, key: &str) -> StorageResult<StoredFile>;

    /// Remove the object at `key`; `NotFound` if there is none
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}
