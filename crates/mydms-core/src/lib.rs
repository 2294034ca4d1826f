//! mydms Core Library
//!
//! This crate provides the domain models, error types, configuration and sanitizing
//! shared by the mydms crates.

pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod sanitizer;
pub mod storage_types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
