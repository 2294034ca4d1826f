use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use mydms_core::models::DictionaryEntry;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct NameQuery {
    /// Part of the name, matched case-insensitively
    #[serde(default)]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "tags",
    responses(
        (status = 200, description = "All tags", body = Vec<DictionaryEntry>),
        (status = 500, description = "Internal server error", body = crate::error::ProblemDetails)
    )
)]
pub async fn get_all_tags(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tags = state.tags.get_all().await?;
    Ok(Json(tags))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/search",
    tag = "tags",
    params(NameQuery),
    responses(
        (status = 200, description = "Matching tags", body = Vec<DictionaryEntry>),
        (status = 500, description = "Internal server error", body = crate::error::ProblemDetails)
    )
)]
pub async fn search_tags(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tags = state.tags.search(&query.name).await?;
    Ok(Json(tags))
}
