use crate::keys::{object_key, validate_key};
use crate::traits::{FileItem, Storage, StorageError, StorageResult, StoredFile};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const MIME_SUFFIX: &str = ".mime";
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Local filesystem storage implementation
///
/// Objects are plain files below `base_path`; the mime type is kept in a sidecar
/// file named `<object>.mime`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path` (e.g. "/var/lib/mydms/files")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        if storage_key.ends_with(MIME_SUFFIX) {
            return Err(StorageError::InvalidKey(
                "Storage key uses a reserved suffix".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn mime_path(path: &Path) -> PathBuf {
        let mut sidecar = path.as_os_str().to_os_string();
        sidecar.push(MIME_SUFFIX);
        PathBuf::from(sidecar)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(&self, file: FileItem) -> StorageResult<String> {
        let key = object_key(&file.folder_name, &file.file_name);
        let path = self.key_to_path(&key)?;
        let size = file.payload.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        Self::write_file(&path, &file.payload).await?;
        Self::write_file(&Self::mime_path(&path), file.mime_type.as_bytes()).await?;

        tracing::info!(
            key = %key,
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(key)
    }

    async fn get(&self, key: &str) -> StorageResult<StoredFile> {
        let path = self.key_to_path(key)?;

        let payload = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let mime_type = match fs::read_to_string(Self::mime_path(&path)).await {
            Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => DEFAULT_MIME_TYPE.to_string(),
        };

        Ok(StoredFile {
            mime_type,
            payload: Bytes::from(payload),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        if let Err(e) = fs::remove_file(Self::mime_path(&path)).await {
            tracing::debug!(error = %e, key = %key, "No mime sidecar to remove");
        }

        tracing::info!(key = %key, "Local delete successful");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn item(name: &str, mime: &str, data: &'static [u8]) -> FileItem {
        FileItem {
            file_name: name.to_string(),
            folder_name: "2024_01_31".to_string(),
            mime_type: mime.to_string(),
            payload: Bytes::from_static(data),
        }
    }

    #[tokio::test]
    async fn test_local_storage_save_get() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let key = storage
            .save(item("test.txt", "text/plain", b"test data"))
            .await
            .unwrap();
        assert_eq!(key, "2024_01_31/test.txt");

        let file = storage.get(&key).await.unwrap();
        assert_eq!(file.payload, Bytes::from_static(b"test data"));
        assert_eq!(file.mime_type, "text/plain");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.delete("2024_01_31/file.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_removes_sidecar() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let key = storage
            .save(item("a.pdf", "application/pdf", b"pdf"))
            .await
            .unwrap();
        storage.delete(&key).await.unwrap();

        assert!(!storage.exists(&key).await.unwrap());
        assert!(!dir.path().join("2024_01_31/a.pdf.mime").exists());
    }
}
