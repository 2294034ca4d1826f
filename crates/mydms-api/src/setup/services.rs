//! Repository and service wiring

use crate::constants::REQUEST_DEADLINE_SECS;
use crate::services::{DocumentService, WriteSettings};
use crate::state::AppState;
use anyhow::Result;
use mydms_core::config::UploadConfig;
use mydms_core::AppConfig;
use mydms_db::{
    DictionaryRepository, DictionaryResolver, DocumentRepository, PgUnitOfWorkProvider,
    UploadRepository,
};
use mydms_storage::Storage;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub async fn initialize_services(
    config: &AppConfig,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let documents = DocumentRepository::new(pool.clone());
    let tags = DictionaryRepository::tags(pool.clone());
    let senders = DictionaryRepository::senders(pool.clone());
    let uploads = UploadRepository::new(pool.clone());

    let upload = UploadConfig {
        allowed_file_types: config.allowed_file_types(),
        ..config.upload.clone()
    };

    let document_service = DocumentService::new(
        PgUnitOfWorkProvider::new(pool.clone()),
        Arc::new(documents.clone()),
        DictionaryResolver::new(Arc::new(tags.clone())),
        DictionaryResolver::new(Arc::new(senders.clone())),
        Arc::new(uploads.clone()),
        storage.clone(),
        WriteSettings {
            upload_path: PathBuf::from(&upload.upload_path),
            max_upload_size: upload.max_upload_size,
            deadline: Duration::from_secs(REQUEST_DEADLINE_SECS),
        },
    );

    Ok(Arc::new(AppState {
        pool,
        documents,
        tags,
        senders,
        uploads,
        storage,
        document_service: Arc::new(document_service),
        upload,
    }))
}
