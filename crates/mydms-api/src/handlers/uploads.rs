use crate::error::{HttpAppError, ProblemDetails};
use crate::services::staging::{file_extension, staging_file};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use mydms_core::config::UploadConfig;
use mydms_core::ids::new_id;
use mydms_core::models::{UploadItem, UploadResult};
use mydms_core::AppError;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

struct ReceivedFile {
    file_name: String,
    mime_type: String,
    payload: Vec<u8>,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<ReceivedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let payload = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;

        return Ok(ReceivedFile {
            file_name,
            mime_type,
            payload: payload.to_vec(),
        });
    }
    Err(AppError::BadRequest("no file provided".to_string()))
}

/// Check the file against the upload rules; returns its lowercase extension
fn check_upload(file: &ReceivedFile, config: &UploadConfig) -> Result<String, AppError> {
    let ext = file_extension(&file.file_name).unwrap_or_default();
    if !config.allowed_file_types.iter().any(|t| *t == ext) {
        return Err(AppError::BadRequest(format!(
            "the uploaded file-type '{}' is not allowed, only use: '{}'",
            ext,
            config.allowed_file_types.join(",")
        )));
    }
    if file.payload.len() as u64 > config.max_upload_size {
        return Err(AppError::BadRequest(format!(
            "the upload exceeds the maximum size of {}",
            config.max_upload_size
        )));
    }
    Ok(ext)
}

#[utoipa::path(
    post,
    path = "/api/v1/uploads/file",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File staged", body = UploadResult),
        (status = 400, description = "No file, file-type not allowed or file too large", body = ProblemDetails),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = read_file_field(&mut multipart).await?;
    check_upload(&file, &state.upload)?;

    let token = new_id();
    let path = staging_file(Path::new(&state.upload.upload_path), &token, &file.file_name);
    tokio::fs::write(&path, &file.payload).await.map_err(|e| {
        AppError::internal(
            format!("could not write upload to '{}'", path.display()),
            e,
        )
    })?;

    let item = UploadItem {
        id: token.clone(),
        file_name: file.file_name.clone(),
        mime_type: file.mime_type,
        created: Utc::now(),
    };
    if let Err(e) = state.uploads.write(&item, None).await {
        if let Err(remove_err) = tokio::fs::remove_file(&path).await {
            tracing::warn!(error = %remove_err, path = %path.display(), "Failed to remove upload after error");
        }
        return Err(e.context("could not stage the upload").into());
    }

    tracing::info!(
        token = %token,
        file_name = %file.file_name,
        size_bytes = file.payload.len(),
        "File staged"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResult {
            token,
            message: format!("File '{}' was uploaded successfully!", file.file_name),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> UploadConfig {
        UploadConfig {
            allowed_file_types: vec!["pdf".to_string(), "png".to_string()],
            max_upload_size: 8,
            upload_path: "/tmp".to_string(),
        }
    }

    fn file(name: &str, size: usize) -> ReceivedFile {
        ReceivedFile {
            file_name: name.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            payload: vec![0; size],
        }
    }

    #[test]
    fn test_allowed_type_case_insensitive() {
        assert_eq!(check_upload(&file("Scan.PDF", 4), &config()).unwrap(), "pdf");
    }

    #[test]
    fn test_disallowed_type() {
        let err = check_upload(&file("setup.exe", 4), &config()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bad request: the uploaded file-type 'exe' is not allowed, only use: 'pdf,png'"
        );
    }

    #[test]
    fn test_too_large() {
        let err = check_upload(&file("invoice.pdf", 9), &config()).unwrap_err();
        assert!(err
            .to_string()
            .contains("the upload exceeds the maximum size of 8"));
    }
}
