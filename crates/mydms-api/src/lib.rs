//! mydms API library
//!
//! HTTP handlers, the document write path, authentication and application setup.

mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod telemetry;

pub use error::HttpAppError;
pub use services::DocumentService;
pub use state::AppState;
