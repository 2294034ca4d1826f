//! Route configuration and setup.
//!
//! Domain route groups live in [domains](domains).

mod domains;

use crate::auth::cache::TokenCache;
use crate::auth::middleware::{auth_middleware, AuthState};
use crate::constants::MULTIPART_OVERHEAD_BYTES;
use crate::error::problem_details_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::get,
    Json, Router,
};
use mydms_core::AppConfig;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &AppConfig, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let auth_state = AuthState::new(
        config.security.clone(),
        TokenCache::new(config.cache_duration()?),
    );

    let protected_routes = protected_routes(state.clone()).layer(
        axum::middleware::from_fn_with_state(Arc::new(auth_state), auth_middleware),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let body_limit = usize::try_from(state.upload.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let app = protected_routes
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api-docs/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // outermost, so rejections of every inner layer are negotiated too
        .layer(axum::middleware::from_fn(problem_details_middleware))
        .with_state(state);

    Ok(app)
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    domains::document_routes(state.clone())
        .merge(domains::upload_routes(state.clone()))
        .merge(domains::dictionary_routes(state.clone()))
        .merge(domains::appinfo_routes(state))
}
