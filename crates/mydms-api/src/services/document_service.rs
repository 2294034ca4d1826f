//! Document write path
//!
//! Saving and deleting a document touches the database, the object store and the
//! upload staging area. Database work runs in one unit of work; the object store and
//! the staging directory are outside of it.

use super::staging::{read_staged, staging_file};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::Utc;
use mydms_core::{
    models::{ActionResult, Document, DocumentDto},
    sanitizer::sanitize_document,
    AppError,
};
use mydms_db::{DictionaryResolver, DocumentStore, UnitOfWorkProvider, UploadStore};
use mydms_storage::{
    keys::{folder_for, key_from_path},
    FileItem, Storage,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Limits of the write path
#[derive(Debug, Clone)]
pub struct WriteSettings {
    /// Directory holding staged upload payloads
    pub upload_path: PathBuf,
    pub max_upload_size: u64,
    /// Deadline of a single save or delete
    pub deadline: Duration,
}

/// Orchestrates document saves and deletes across all stores
pub struct DocumentService<P: UnitOfWorkProvider> {
    provider: P,
    documents: Arc<dyn DocumentStore<P::Unit>>,
    tags: DictionaryResolver<P::Unit>,
    senders: DictionaryResolver<P::Unit>,
    uploads: Arc<dyn UploadStore<P::Unit>>,
    storage: Arc<dyn Storage>,
    settings: WriteSettings,
}

impl<P: UnitOfWorkProvider> DocumentService<P> {
    pub fn new(
        provider: P,
        documents: Arc<dyn DocumentStore<P::Unit>>,
        tags: DictionaryResolver<P::Unit>,
        senders: DictionaryResolver<P::Unit>,
        uploads: Arc<dyn UploadStore<P::Unit>>,
        storage: Arc<dyn Storage>,
        settings: WriteSettings,
    ) -> Self {
        Self {
            provider,
            documents,
            tags,
            senders,
            uploads,
            storage,
            settings,
        }
    }

    /// Insert or update a document; the result tells which of the two happened.
    pub async fn save(&self, dto: DocumentDto) -> Result<(Document, ActionResult), AppError> {
        let deadline = self.settings.deadline;
        tokio::time::timeout(deadline, self.save_document(dto))
            .await
            .map_err(|_| {
                AppError::Internal(format!(
                    "saving the document did not finish within {}s",
                    deadline.as_secs()
                ))
            })?
    }

    /// Delete document `id` together with its file
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let deadline = self.settings.deadline;
        tokio::time::timeout(deadline, self.delete_document(id))
            .await
            .map_err(|_| {
                AppError::Internal(format!(
                    "deleting document '{}' did not finish within {}s",
                    id,
                    deadline.as_secs()
                ))
            })?
    }

    async fn save_document(&self, dto: DocumentDto) -> Result<(Document, ActionResult), AppError> {
        let mut unit = self
            .provider
            .begin()
            .await
            .map_err(|e| e.context("could not start a unit of work"))?;
        let result = self.save_in(dto, &mut unit).await;
        self.provider.finish(unit, result).await
    }

    async fn delete_document(&self, id: &str) -> Result<(), AppError> {
        let mut unit = self
            .provider
            .begin()
            .await
            .map_err(|e| e.context("could not start a unit of work"))?;
        let result = self.delete_in(id, &mut unit).await;
        self.provider.finish(unit, result).await
    }

    async fn save_in(
        &self,
        dto: DocumentDto,
        unit: &mut P::Unit,
    ) -> Result<(Document, ActionResult), AppError> {
        let mut dto = sanitize_document(dto);
        if dto.title.trim().is_empty() {
            return Err(AppError::BadRequest(
                "a document needs a title that is not empty after sanitizing".into(),
            ));
        }

        if let Some(token) = dto.upload_token().map(str::to_string) {
            dto.file_name = self.attach_upload(&token, &dto.file_name, unit).await?;
        }

        let tags = self
            .tags
            .resolve(&dto.tags, unit)
            .await
            .map_err(|e| e.context("could not resolve tags"))?;
        let senders = self
            .senders
            .resolve(&dto.senders, unit)
            .await
            .map_err(|e| e.context("could not resolve senders"))?;

        let existing = if dto.id.is_empty() {
            None
        } else {
            match self.documents.get(&dto.id, unit).await {
                Ok(doc) => Some(doc),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(document_id = %dto.id, "Unknown document id, inserting a new document");
                    None
                }
                Err(e) => return Err(e.context(format!("could not read document '{}'", dto.id))),
            }
        };
        let action = if existing.is_some() {
            ActionResult::Updated
        } else {
            ActionResult::Created
        };

        let preview_link = if dto.file_name.is_empty() {
            None
        } else {
            Some(STANDARD.encode(dto.file_name.as_bytes()))
        };

        let (id, alt_id, created) = match existing {
            Some(doc) => (doc.id, doc.alt_id, doc.created),
            None => (String::new(), String::new(), Utc::now()),
        };

        let entity = Document {
            id,
            alt_id,
            title: dto.title,
            file_name: dto.file_name,
            preview_link,
            amount: dto.amount,
            tag_list: tags.display,
            sender_list: senders.display,
            created,
            modified: None,
        };

        let saved = self
            .documents
            .save(entity, unit)
            .await
            .map_err(|e| e.context("could not save document"))?;

        self.documents
            .save_references(&saved.id, &tags.ids, &senders.ids, unit)
            .await
            .map_err(|e| e.context(format!("could not save references of document '{}'", saved.id)))?;

        tracing::info!(
            document_id = %saved.id,
            action = ?action,
            tags = tags.ids.len(),
            senders = senders.ids.len(),
            "Document saved"
        );
        Ok((saved, action))
    }

    /// Move a staged upload into the object store; returns the recorded file path
    async fn attach_upload(
        &self,
        token: &str,
        file_name: &str,
        unit: &mut P::Unit,
    ) -> Result<String, AppError> {
        if file_name.is_empty() {
            return Err(AppError::Internal(format!(
                "upload-file error: the upload '{}' has no file name",
                token
            )));
        }

        let item = self
            .uploads
            .read(token)
            .await
            .map_err(|e| {
                AppError::internal(
                    format!("upload-file error: could not read upload '{}'", token),
                    e,
                )
            })?;

        let folder = folder_for(&Utc::now());
        let staged = staging_file(&self.settings.upload_path, token, file_name);
        let payload = read_staged(&staged, self.settings.max_upload_size)
            .await
            .map_err(|e| {
                AppError::internal("upload-file error: could not read the staged file", e)
            })?;

        self.storage
            .save(FileItem {
                file_name: file_name.to_string(),
                folder_name: folder.clone(),
                mime_type: item.mime_type,
                payload: Bytes::from(payload),
            })
            .await
            .map_err(|e| {
                AppError::internal("upload-file error: could not store the uploaded file", e)
            })?;

        // the disk file goes first so a failure leaves an orphan file, never an orphan row
        if let Err(e) = tokio::fs::remove_file(&staged).await {
            tracing::warn!(error = %e, path = %staged.display(), "Failed to remove staged file");
        }
        if let Err(e) = self.uploads.delete(token, unit).await {
            tracing::warn!(error = %e, token = %token, "Failed to remove staging entry");
        }

        Ok(format!("/{}/{}", folder, file_name))
    }

    async fn delete_in(&self, id: &str, unit: &mut P::Unit) -> Result<(), AppError> {
        let file_name = self
            .documents
            .exists(id, unit)
            .await
            .map_err(|e| e.context(format!("could not delete document '{}'", id)))?;

        self.documents
            .delete(id, unit)
            .await
            .map_err(|e| e.context(format!("could not delete document '{}'", id)))?;

        if !file_name.is_empty() {
            let key = key_from_path(&file_name);
            // a missing object is a failure as well, the row stays
            self.storage
                .delete(&key)
                .await
                .map_err(|e| AppError::Storage(format!("could not delete file '{}': {}", key, e)))?;
        }

        tracing::info!(document_id = %id, file = %file_name, "Document deleted");
        Ok(())
    }
}
