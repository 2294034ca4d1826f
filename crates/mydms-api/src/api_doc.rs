//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use mydms_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "mydms API",
        description = "Document management backend: documents with tags and senders, staged uploads and file retrieval. All endpoints are versioned under /api/v1/ and require a JWT."
    ),
    paths(
        // Documents
        handlers::documents::save_document,
        handlers::documents::delete_document,
        handlers::documents::get_document,
        handlers::documents::search_documents,
        // Uploads and files
        handlers::uploads::upload_file,
        handlers::filestore::get_file,
        // Dictionaries
        handlers::tags::get_all_tags,
        handlers::tags::search_tags,
        handlers::senders::get_all_senders,
        handlers::senders::search_senders,
        // Application
        handlers::appinfo::get_appinfo,
    ),
    components(
        schemas(
            models::DocumentDto,
            models::PagedDocuments,
            models::ActionOutcome,
            models::ActionResult,
            models::DictionaryEntry,
            models::UploadResult,
            models::AppInfo,
            models::UserInfo,
            models::VersionInfo,
            error::ProblemDetails,
        )
    ),
    tags(
        (name = "documents", description = "Create, update, delete, read and search documents"),
        (name = "uploads", description = "Staging of files before they are attached to a document"),
        (name = "files", description = "Retrieval of stored document files"),
        (name = "tags", description = "Tag catalog"),
        (name = "senders", description = "Sender catalog"),
        (name = "appinfo", description = "Current user and build information"),
    )
)]
pub struct ApiDoc;
