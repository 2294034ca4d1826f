use crate::error::{HttpAppError, ProblemDetails};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mydms_core::AppError;
use mydms_storage::keys::key_from_path;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct FileQuery {
    /// Base64 encoded file path as recorded on the document
    pub path: Option<String>,
}

/// Object key for a base64 encoded document path
pub fn decode_path(encoded: Option<&str>) -> Result<String, AppError> {
    let encoded = encoded
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing parameter 'path'".to_string()))?;

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| AppError::BadRequest(format!("the path '{}' is not valid: {}", encoded, e)))?;
    let path = String::from_utf8(decoded)
        .map_err(|_| AppError::BadRequest(format!("the path '{}' is not valid", encoded)))?;

    Ok(key_from_path(&path))
}

#[utoipa::path(
    get,
    path = "/api/v1/file",
    tag = "files",
    params(FileQuery),
    responses(
        (status = 200, description = "Raw file content with its mime type"),
        (status = 400, description = "Missing or invalid path", body = ProblemDetails),
        (status = 404, description = "File not found", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = decode_path(query.path.as_deref())?;
    let file = state.storage.get(&key).await?;

    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        file.payload,
    ))
}
