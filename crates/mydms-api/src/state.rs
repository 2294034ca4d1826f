//! Application state shared by all handlers.

use crate::services::DocumentService;
use mydms_core::config::UploadConfig;
use mydms_db::{DictionaryRepository, DocumentRepository, PgUnitOfWorkProvider, UploadRepository};
use mydms_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything the write path needs, wired to PostgreSQL
pub type PgDocumentService = DocumentService<PgUnitOfWorkProvider>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub documents: DocumentRepository,
    pub tags: DictionaryRepository,
    pub senders: DictionaryRepository,
    pub uploads: UploadRepository,
    pub storage: Arc<dyn Storage>,
    pub document_service: Arc<PgDocumentService>,
    pub upload: UploadConfig,
}
