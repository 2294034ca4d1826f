//! Data models for the application
//!
//! Row types used by the repositories and the DTOs exchanged over the API.

mod appinfo;
mod dictionary;
mod document;
mod result;
mod upload;

pub use appinfo::*;
pub use dictionary::*;
pub use document::*;
pub use result::*;
pub use upload::*;
