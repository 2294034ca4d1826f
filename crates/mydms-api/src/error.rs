//! HTTP error response conversion
//!
//! Errors leave the API as RFC 7807 Problem Details. `HttpAppError` renders the JSON
//! form and records the error in the response extensions; [`problem_details_middleware`]
//! then picks the final representation from the request's `Accept` header.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>` and
//! convert domain errors with `?` or `.map_err(HttpAppError::from)`.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use mydms_core::{AppError, ErrorMetadata, LogLevel};
use mydms_storage::StorageError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;

const PROBLEM_JSON: &str = "application/problem+json";
const PROBLEM_TYPE: &str = "about:blank";

/// RFC 7807 error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from mydms-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

/// Convert JSON body deserialization failures into a 400.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::BadRequest(format!(
            "could not bind the supplied document: {}",
            rejection.body_text()
        )))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            other => AppError::Storage(other.to_string()),
        };
        HttpAppError(app)
    }
}

/// JSON body extractor that answers with Problem Details (400) on deserialization failure.
/// Use this instead of `Json<T>` for request bodies.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

/// Representation of an error chosen by content negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemFormat {
    Html,
    Json,
    Text,
}

/// Pick the error representation from an `Accept` header.
///
/// Media ranges are ordered by their q-value, keeping the header order for equal
/// weights; the subtype of the first one decides.
pub fn negotiate(accept: Option<&str>) -> ProblemFormat {
    let Some(accept) = accept else {
        return ProblemFormat::Json;
    };

    let mut ranges: Vec<(&str, f32)> = accept
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let media = parts.next()?.trim();
            if media.is_empty() {
                return None;
            }
            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((media, quality))
        })
        .collect();

    // sort_by is stable
    ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let Some((media, _)) = ranges.first() else {
        return ProblemFormat::Json;
    };
    let subtype = media
        .split_once('/')
        .map(|(_, s)| s.to_lowercase())
        .unwrap_or_default();

    match subtype.as_str() {
        "html" => ProblemFormat::Html,
        "plain" => ProblemFormat::Text,
        s if s == "json" || s.ends_with("+json") => ProblemFormat::Json,
        _ => ProblemFormat::Json,
    }
}

/// An error response waiting for its final representation
#[derive(Debug, Clone)]
pub struct RenderedError {
    pub status: StatusCode,
    pub title: String,
    pub detail: String,
    /// Login location of redirect errors
    pub redirect: Option<String>,
}

impl RenderedError {
    fn from_app_error(error: &AppError) -> Self {
        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let redirect = match error {
            AppError::Redirect { url, .. } => Some(url.clone()),
            _ => None,
        };
        Self {
            status,
            title: error.problem_title().to_string(),
            detail: error.client_message(),
            redirect,
        }
    }

    pub fn problem(&self, instance: &str) -> ProblemDetails {
        ProblemDetails {
            problem_type: PROBLEM_TYPE.to_string(),
            title: self.title.clone(),
            status: self.status.as_u16(),
            detail: self.detail.clone(),
            instance: self
                .redirect
                .clone()
                .unwrap_or_else(|| instance.to_string()),
        }
    }

    pub fn render(&self, format: ProblemFormat, instance: &str) -> Response {
        let mut response = match format {
            ProblemFormat::Json => {
                let mut response = (self.status, Json(self.problem(instance))).into_response();
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(PROBLEM_JSON),
                );
                response
            }
            ProblemFormat::Text => self.text(),
            ProblemFormat::Html => match self
                .redirect
                .as_deref()
                .and_then(|url| HeaderValue::from_str(url).ok())
            {
                Some(location) => {
                    let mut response = StatusCode::TEMPORARY_REDIRECT.into_response();
                    response.headers_mut().insert(header::LOCATION, location);
                    response
                }
                None => self.text(),
            },
        };
        response.extensions_mut().insert(self.clone());
        response
    }

    fn text(&self) -> Response {
        (self.status, format!("{}: {}", self.title, self.detail)).into_response()
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                error_type = error_type,
                details = %error.detailed_message(),
                "Error occurred"
            );
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        log_error(&self.0);
        RenderedError::from_app_error(&self.0).render(ProblemFormat::Json, "")
    }
}

/// Re-render error responses according to the request's `Accept` header and fill in the
/// Problem Details `instance`.
pub async fn problem_details_middleware(request: Request, next: Next) -> Response {
    let format = negotiate(accept_header(request.headers()));
    let instance = request.uri().path().to_string();

    let response = next.run(request).await;
    match response.extensions().get::<RenderedError>() {
        Some(rendered) => rendered.clone().render(format, &instance),
        None => response,
    }
}

fn accept_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::ACCEPT).and_then(|h| h.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error_not_found() {
        let storage_err = StorageError::NotFound("File not found".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::NotFound(msg) => assert_eq!(msg, "File not found"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_upload_failed() {
        let storage_err = StorageError::UploadFailed("Upload failed".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::Storage(msg) => assert!(msg.contains("Upload failed")),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_from_storage_error_invalid_key() {
        let storage_err = StorageError::InvalidKey("Invalid key".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::InvalidInput(msg) => assert_eq!(msg, "Invalid key"),
            _ => panic!("Expected InvalidInput variant"),
        }
    }

    #[test]
    fn test_from_storage_error_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "IO error");
        let storage_err = StorageError::IoError(io_err);
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::Internal(msg) => assert!(msg.contains("IO error")),
            _ => panic!("Expected Internal variant"),
        }
    }

    #[test]
    fn test_negotiate_orders_by_quality() {
        let accept = "text/plain; q=0.5, application/json, text/x-dvi; q=0.8, text/x-c";
        assert_eq!(negotiate(Some(accept)), ProblemFormat::Json);
    }

    #[test]
    fn test_negotiate_keeps_order_for_equal_quality() {
        assert_eq!(negotiate(Some("text/plain, application/json")), ProblemFormat::Text);
        assert_eq!(negotiate(Some("text/x-c, text/plain")), ProblemFormat::Json);
    }

    #[test]
    fn test_negotiate_browser() {
        let accept = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
        assert_eq!(negotiate(Some(accept)), ProblemFormat::Html);
    }

    #[test]
    fn test_negotiate_defaults_to_json() {
        assert_eq!(negotiate(None), ProblemFormat::Json);
        assert_eq!(negotiate(Some("")), ProblemFormat::Json);
        assert_eq!(negotiate(Some("*/*")), ProblemFormat::Json);
        assert_eq!(negotiate(Some("application/problem+json")), ProblemFormat::Json);
    }

    #[test]
    fn test_problem_uses_instance_path() {
        let rendered = RenderedError::from_app_error(&AppError::NotFound(
            "no document with id 'D9'".to_string(),
        ));
        let problem = rendered.problem("/api/v1/documents/D9");

        assert_eq!(problem.problem_type, "about:blank");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "object cannot be found");
        assert_eq!(problem.detail, "no document with id 'D9'");
        assert_eq!(problem.instance, "/api/v1/documents/D9");
    }

    #[test]
    fn test_redirect_problem_points_to_login() {
        let rendered = RenderedError::from_app_error(&AppError::Redirect {
            status: 401,
            message: "Invalid authentication, no JWT token present!".to_string(),
            url: "https://login.example.com".to_string(),
        });
        let problem = rendered.problem("/api/v1/tags");
        assert_eq!(problem.status, 401);
        assert_eq!(problem.instance, "https://login.example.com");
    }

    #[test]
    fn test_render_html_redirect() {
        let rendered = RenderedError::from_app_error(&AppError::Redirect {
            status: 403,
            message: "Invalid authorization".to_string(),
            url: "https://login.example.com".to_string(),
        });
        let response = rendered.render(ProblemFormat::Html, "/api/v1/tags");

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://login.example.com"
        );
    }

    #[test]
    fn test_render_json_content_type() {
        let response = HttpAppError(AppError::BadRequest("no file provided".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_JSON
        );
        assert!(response.extensions().get::<RenderedError>().is_some());
    }

    #[test]
    fn test_render_html_without_redirect_is_text() {
        let rendered =
            RenderedError::from_app_error(&AppError::Internal("disk gone".to_string()));
        let response = rendered.render(ProblemFormat::Html, "/api/v1/file");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}
