//! Services composing several repositories and the object store

pub mod document_service;
pub mod staging;

pub use document_service::{DocumentService, WriteSettings};
