//! Domain errors of mydms
//!
//! Every layer reports failures as [`AppError`]; the HTTP layer turns them into
//! Problem Details responses using [`ErrorMetadata`].
//!
//! Without the `sqlx` feature the `Database` variant carries a plain message.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// How loudly an error is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Client mistakes
    Debug,
    Warn,
    /// Infrastructure failures
    Error,
}

/// Presentation of an error towards clients and logs
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable code such as `NOT_FOUND`
    fn error_code(&self) -> &'static str;

    /// Short, human-readable summary of the problem type (Problem Details `title`)
    fn problem_title(&self) -> &'static str;

    /// A retry may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show a client; internal details are replaced
    fn client_message(&self) -> String;

    /// The display form contains internals that must not reach a client
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Object store error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Authentication failure that browsers resolve by following `url`.
    /// `status` is used for non-browser clients (401 or 403).
    #[error("{message}")]
    Redirect {
        status: u16,
        message: String,
        url: String,
    },
}

impl AppError {
    /// Wrap any error with a context message, keeping the source chain.
    pub fn internal<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        AppError::InternalWithSource {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Prefix the error with context while keeping its kind.
    ///
    /// Infrastructure errors are never reclassified: a database failure stays a 500
    /// and a missing resource stays a 404.
    pub fn context(self, context: impl AsRef<str>) -> Self {
        let context = context.as_ref();
        match self {
            AppError::NotFound(msg) => AppError::NotFound(format!("{}: {}", context, msg)),
            AppError::BadRequest(msg) => AppError::BadRequest(format!("{}: {}", context, msg)),
            AppError::InvalidInput(msg) => {
                AppError::InvalidInput(format!("{}: {}", context, msg))
            }
            AppError::Storage(msg) => AppError::Storage(format!("{}: {}", context, msg)),
            AppError::Internal(msg) => AppError::Internal(format!("{}: {}", context, msg)),
            AppError::InternalWithSource { message, source } => AppError::InternalWithSource {
                message: format!("{}: {}", context, message),
                source,
            },
            other => AppError::InternalWithSource {
                message: format!("{}: {}", context, other),
                source: anyhow::Error::new(other),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, title, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            "cannot service the request",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            "cannot service the request",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            "the request is not valid",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            "the request is not valid",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            "object cannot be found",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            "cannot service the request",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            "cannot service the request",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            "the request is not authenticated",
            false,
            Some("Provide a valid authentication token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            "the request is not authorized",
            false,
            Some("Request the required role for this application"),
            false,
            LogLevel::Debug,
        ),
        AppError::Redirect { status, .. } => (
            *status,
            "REDIRECT",
            "a redirect to the login is necessary",
            false,
            Some("Follow the login redirect and retry"),
            false,
            LogLevel::Debug,
        ),
    }
}

impl AppError {
    /// Variant name used as a log field
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Redirect { .. } => "Redirect",
        }
    }

    /// The error followed by up to five of its causes, one per line
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn problem_title(&self) -> &'static str {
        app_error_static_metadata(self).2
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).4
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).5
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).6
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access the object store".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::Redirect { ref message, .. } => message.clone(),
        }
    }
}
