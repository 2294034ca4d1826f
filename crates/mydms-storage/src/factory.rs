use crate::object::{ObjectStorage, S3Settings};
use crate::{LocalStorage, Storage, StorageBackend, StorageError, StorageResult};
use mydms_core::config::FilestoreConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &FilestoreConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.backend() {
        StorageBackend::S3 => {
            if config.bucket.is_empty() {
                return Err(StorageError::ConfigError(
                    "filestore.bucket not configured".to_string(),
                ));
            }
            let storage = ObjectStorage::s3(S3Settings {
                bucket: config.bucket.clone(),
                region: config.region.clone(),
                key: config.key.clone(),
                secret: config.secret.clone(),
                endpoint: config.endpoint.clone(),
            })?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Local => {
            let base_path = config.local_path.clone().ok_or_else(|| {
                StorageError::ConfigError("filestore.localPath not configured".to_string())
            })?;
            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory object store, files are lost on restart");
            Ok(Arc::new(ObjectStorage::in_memory()))
        }
    }
}
