use crate::error::HttpAppError;
use crate::handlers::tags::NameQuery;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use mydms_core::models::DictionaryEntry;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/v1/senders",
    tag = "senders",
    responses(
        (status = 200, description = "All senders", body = Vec<DictionaryEntry>),
        (status = 500, description = "Internal server error", body = crate::error::ProblemDetails)
    )
)]
pub async fn get_all_senders(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let senders = state.senders.get_all().await?;
    Ok(Json(senders))
}

#[utoipa::path(
    get,
    path = "/api/v1/senders/search",
    tag = "senders",
    params(NameQuery),
    responses(
        (status = 200, description = "Matching senders", body = Vec<DictionaryEntry>),
        (status = 500, description = "Internal server error", body = crate::error::ProblemDetails)
    )
)]
pub async fn search_senders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let senders = state.senders.search(&query.name).await?;
    Ok(Json(senders))
}
