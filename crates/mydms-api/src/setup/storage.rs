//! Object store and upload staging setup

use anyhow::{Context, Result};
use mydms_core::AppConfig;
use mydms_storage::{create_storage, Storage};
use std::sync::Arc;

/// Create the configured object store and make sure the staging directory exists
pub async fn setup_storage(config: &AppConfig) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(&config.filestore)
        .await
        .context("Failed to initialize object store")?;

    tokio::fs::create_dir_all(&config.upload.upload_path)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory '{}'",
                config.upload.upload_path
            )
        })?;

    tracing::info!(
        backend = %storage.backend_type(),
        bucket = %config.filestore.bucket,
        upload_path = %config.upload.upload_path,
        "Object store initialized"
    );

    Ok(storage)
}
