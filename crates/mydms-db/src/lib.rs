//! mydms database layer
//!
//! PostgreSQL repositories for documents, tag and sender dictionaries and staged
//! uploads, plus the unit-of-work that makes several of them atomic.

pub mod db;

pub use db::*;
