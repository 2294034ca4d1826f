use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mydms_core::AppError;
use serde::{Deserialize, Serialize};

/// JWT payload issued by the login service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "Type", default)]
    pub token_type: String,
    #[serde(rename = "UserName")]
    pub user_name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "UserId", default)]
    pub user_id: String,
    #[serde(rename = "DisplayName", default)]
    pub display_name: String,
    #[serde(rename = "GivenName", default)]
    pub given_name: String,
    #[serde(rename = "Surname", default)]
    pub surname: String,
    /// Entries of the form `name|url|role`
    #[serde(rename = "Claims", default)]
    pub claims: Vec<String>,
    pub iss: String,
    pub exp: i64,
}

/// Authenticated identity stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub roles: Vec<String>,
    pub email: String,
    pub user_id: String,
    pub display_name: String,
    pub authenticated: bool,
}

/// Extractor for the user placed into the request by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "no authenticated user for this request".to_string(),
                ))
            })
    }
}
