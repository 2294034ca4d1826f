//! mydms Storage Library
//!
//! This crate provides the object store abstraction and its implementations for mydms.
//! It includes the Storage trait, an `object_store` backed implementation (S3 and
//! in-memory) and a local filesystem implementation.
//!
//! # Storage key format
//!
//! Files are grouped by the UTC date they were stored: `<yyyy_mm_dd>/<file_name>`.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
pub mod local;
pub mod object;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use mydms_core::StorageBackend;
pub use object::{ObjectStorage, S3Settings};
pub use traits::{FileItem, Storage, StorageError, StorageResult, StoredFile};
