use crate::auth::cache::TokenCache;
use crate::auth::models::{Claims, User};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mydms_core::config::{RequiredClaim, SecurityConfig};
use mydms_core::AppError;
use std::sync::Arc;

const CLAIM_SEPARATOR: char = '|';

pub struct AuthState {
    pub security: SecurityConfig,
    pub cache: TokenCache,
}

impl AuthState {
    pub fn new(security: SecurityConfig, cache: TokenCache) -> Self {
        Self { security, cache }
    }

    fn redirect(&self, status: u16, message: impl Into<String>) -> AppError {
        AppError::Redirect {
            status,
            message: message.into(),
            url: self.security.login_redirect.clone(),
        }
    }

    /// Decode and authorize `token`
    pub fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[self.security.jwt_issuer.as_str()]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.security.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            let reason = match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "the token has expired".to_string(),
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => "invalid token issuer".to_string(),
                _ => format!("invalid token: {}", e),
            };
            self.redirect(401, format!("Invalid authentication: {}", reason))
        })?;

        let claims = token_data.claims;
        let roles = matching_roles(&claims.claims, &self.security.claim);
        if roles.is_empty() {
            return Err(self.redirect(
                403,
                format!(
                    "Invalid authorization: user '{}' has no role of '{}' for '{}'",
                    claims.user_name, self.security.claim.name, self.security.claim.url
                ),
            ));
        }

        Ok(User {
            username: claims.user_name,
            roles,
            email: claims.email,
            user_id: claims.user_id,
            display_name: claims.display_name,
            authenticated: true,
        })
    }
}

/// Roles granted by `claims` for the required claim name and URL
pub fn matching_roles(claims: &[String], required: &RequiredClaim) -> Vec<String> {
    claims
        .iter()
        .filter_map(|claim| {
            let mut parts = claim.splitn(3, CLAIM_SEPARATOR);
            let (name, url, role) = (parts.next()?, parts.next()?, parts.next()?);
            if name == required.name
                && url == required.url
                && required.roles.iter().any(|r| r == role)
            {
                Some(role.to_string())
            } else {
                None
            }
        })
        .collect()
}

/// The bearer token, or the value of the session cookie
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    if cookie_name.is_empty() {
        return None;
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers(), &auth_state.security.cookie_name) else {
        return HttpAppError(
            auth_state.redirect(401, "Invalid authentication, no JWT token present!"),
        )
        .into_response();
    };

    let user = match auth_state.cache.get(&token).await {
        Some(user) => user,
        None => match auth_state.authenticate(&token) {
            Ok(user) => {
                auth_state.cache.put(token, user.clone()).await;
                user
            }
            Err(e) => return HttpAppError(e).into_response(),
        },
    };

    tracing::debug!(user = %user.username, "Request authenticated");
    request.extensions_mut().insert(user);
    next.run(request).await
}
