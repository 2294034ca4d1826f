use crate::constants::DEFAULT_PAGE_SIZE;
use crate::error::{HttpAppError, ProblemDetails, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mydms_core::models::{
    parse_timestamp, ActionOutcome, ActionResult, DocumentDto, DocumentFilter, OrderBy,
    PagedDocuments,
};
use mydms_core::sanitizer::sanitize_document;
use mydms_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "documents",
    request_body = DocumentDto,
    responses(
        (status = 201, description = "Document created", body = ActionOutcome),
        (status = 200, description = "Document updated", body = ActionOutcome),
        (status = 400, description = "Invalid document", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn save_document(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<DocumentDto>,
) -> Result<impl IntoResponse, HttpAppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let (document, action) = state.document_service.save(payload).await?;

    let (status, message) = match action {
        ActionResult::Updated => (
            StatusCode::OK,
            format!("Updated existing document '{}' ({})", document.title, document.id),
        ),
        _ => (
            StatusCode::CREATED,
            format!("Created new document '{}' ({})", document.title, document.id),
        ),
    };

    Ok((status, Json(ActionOutcome::new(action, message))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(
        ("id" = String, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted", body = ActionOutcome),
        (status = 404, description = "Document not found", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.document_service.delete(&id).await?;

    Ok(Json(ActionOutcome::new(
        ActionResult::Deleted,
        format!("Document with id '{}' was deleted.", id),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "documents",
    params(
        ("id" = String, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document found", body = DocumentDto),
        (status = 404, description = "Document not found", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state.documents.get(&id).await?;
    Ok(Json(sanitize_document(DocumentDto::from(document))))
}

/// Search parameters; unparseable values fall back to their defaults
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub title: Option<String>,
    pub tag: Option<String>,
    pub sender: Option<String>,
    /// Lower bound of `created`, e.g. `2024-01-01T00:00:00+01:00`
    pub from: Option<String>,
    /// Upper bound of `created`
    pub to: Option<String>,
    /// Page size, 20 by default
    pub limit: Option<String>,
    /// Number of documents to skip
    pub skip: Option<String>,
}

impl SearchQuery {
    pub fn filter(&self) -> DocumentFilter {
        DocumentFilter {
            title: non_blank(&self.title),
            tag: non_blank(&self.tag),
            sender: non_blank(&self.sender),
            from: self.from.as_deref().and_then(parse_timestamp),
            until: self.to.as_deref().and_then(parse_timestamp),
            limit: parse_number(&self.limit)
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            offset: parse_number(&self.skip).filter(|s| *s >= 0).unwrap_or(0),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_number(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/search",
    tag = "documents",
    params(SearchQuery),
    responses(
        (status = 200, description = "One page of matching documents", body = PagedDocuments),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn search_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let filter = query.filter();
    let (documents, total_entries) = state
        .documents
        .search(&filter, &OrderBy::default_order())
        .await?;

    Ok(Json(PagedDocuments {
        documents: documents
            .into_iter()
            .map(|doc| sanitize_document(DocumentDto::from(doc)))
            .collect(),
        total_entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_search_defaults() {
        let filter = SearchQuery::default().filter();
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.offset, 0);
        assert!(filter.title.is_none());
        assert!(filter.from.is_none());
    }

    #[test]
    fn test_search_parses_parameters() {
        let query = SearchQuery {
            title: Some("invoice".to_string()),
            tag: Some("  ".to_string()),
            from: Some("2024-01-01T00:00:00+01:00".to_string()),
            to: Some("last week".to_string()),
            limit: Some("5".to_string()),
            skip: Some("10".to_string()),
            ..Default::default()
        };
        let filter = query.filter();

        assert_eq!(filter.title.as_deref(), Some("invoice"));
        assert!(filter.tag.is_none());
        assert_eq!(
            filter.from,
            Some(Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap())
        );
        assert!(filter.until.is_none());
        assert_eq!(filter.limit, 5);
        assert_eq!(filter.offset, 10);
    }

    #[test]
    fn test_search_ignores_invalid_paging() {
        let query = SearchQuery {
            limit: Some("many".to_string()),
            skip: Some("-3".to_string()),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.offset, 0);
    }
}
