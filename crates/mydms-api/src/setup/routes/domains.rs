//! Domain route groups (documents, uploads, files, dictionaries, appinfo).

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn document_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // the static search segment takes precedence over {id}
    Router::new()
        .route(
            &format!("{}/documents", API_PREFIX),
            post(handlers::documents::save_document),
        )
        .route(
            &format!("{}/documents/search", API_PREFIX),
            get(handlers::documents::search_documents),
        )
        .route(
            &format!("{}/documents/{{id}}", API_PREFIX),
            get(handlers::documents::get_document).delete(handlers::documents::delete_document),
        )
        .with_state(state)
}

pub fn upload_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/uploads/file", API_PREFIX),
            post(handlers::uploads::upload_file),
        )
        .route(
            &format!("{}/file", API_PREFIX),
            get(handlers::filestore::get_file),
        )
        .with_state(state)
}

pub fn dictionary_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(&format!("{}/tags", API_PREFIX), get(handlers::tags::get_all_tags))
        .route(
            &format!("{}/tags/search", API_PREFIX),
            get(handlers::tags::search_tags),
        )
        .route(
            &format!("{}/senders", API_PREFIX),
            get(handlers::senders::get_all_senders),
        )
        .route(
            &format!("{}/senders/search", API_PREFIX),
            get(handlers::senders::search_senders),
        )
        .with_state(state)
}

pub fn appinfo_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/appinfo", API_PREFIX),
            get(handlers::appinfo::get_appinfo),
        )
        .with_state(state)
}
