use crate::keys::{object_key, validate_key};
use crate::traits::{FileItem, Storage, StorageError, StorageResult, StoredFile};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::sync::Arc;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Settings of an S3 compatible bucket
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Access key id; credentials are taken from the environment when empty
    pub key: String,
    pub secret: String,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub endpoint: Option<String>,
}

/// Storage on top of an `object_store` backend. The mime type travels as the
/// `Content-Type` attribute of each object.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn object_store::ObjectStore>,
    bucket: String,
    backend: StorageBackend,
}

impl ObjectStorage {
    /// S3 (or S3-compatible) bucket
    pub fn s3(settings: S3Settings) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(settings.region.clone())
            .with_bucket_name(settings.bucket.clone());

        if !settings.key.is_empty() {
            builder = builder
                .with_access_key_id(settings.key.clone())
                .with_secret_access_key(settings.secret.clone());
        }

        if let Some(ref endpoint) = settings.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: settings.bucket,
            backend: StorageBackend::S3,
        })
    }

    /// Process-local store, used for tests and the `memory` backend
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            bucket: "memory".to_string(),
            backend: StorageBackend::Memory,
        }
    }
}

#[async_trait]
impl Storage for ObjectStorage {
    async fn save(&self, file: FileItem) -> StorageResult<String> {
        let key = object_key(&file.folder_name, &file.file_name);
        validate_key(&key)?;

        let size = file.payload.len() as u64;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, AttributeValue::from(file.mime_type));
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(file.payload), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(key)
    }

    async fn get(&self, key: &str) -> StorageResult<StoredFile> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let mime_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| {
                let value: &str = value.as_ref();
                value.to_string()
            })
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        let payload = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = payload.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(StoredFile { mime_type, payload })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();

        // S3 deletes of missing keys succeed silently
        if !self.exists(key).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let location = Path::from(key.to_string());
        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Path::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn invoice() -> FileItem {
        FileItem {
            file_name: "invoice.pdf".to_string(),
            folder_name: "2024_01_31".to_string(),
            mime_type: "application/pdf".to_string(),
            payload: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn test_save_and_get_keeps_mime_type() {
        let storage = ObjectStorage::in_memory();

        let key = storage.save(invoice()).await.unwrap();
        assert_eq!(key, "2024_01_31/invoice.pdf");

        let file = storage.get(&key).await.unwrap();
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.payload, Bytes::from_static(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let storage = ObjectStorage::in_memory();
        storage.save(invoice()).await.unwrap();

        let mut second = invoice();
        second.payload = Bytes::from_static(b"v2");
        let key = storage.save(second).await.unwrap();

        assert_eq!(storage.get(&key).await.unwrap().payload, Bytes::from_static(b"v2"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let storage = ObjectStorage::in_memory();
        let result = storage.get("2024_01_31/missing.pdf").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let storage = ObjectStorage::in_memory();
        let key = storage.save(invoice()).await.unwrap();

        storage.delete(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());
        assert!(matches!(storage.get(&key).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_fails() {
        let storage = ObjectStorage::in_memory();
        let result = storage.delete("2024_01_31/missing.pdf").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let storage = ObjectStorage::in_memory();
        let result = storage.get("../secret").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
