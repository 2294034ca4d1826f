//! Database repositories for data access layer
//!
//! Each repository is responsible for one table (or one family of tables) and offers
//! its operations both standalone and inside a caller-supplied unit of work.
//
// Unit-of-work over PostgreSQL transactions
pub mod unit_of_work;
//
// Repositories
pub mod dictionary;
pub mod document;
pub mod upload;

pub use dictionary::{DictionaryRepository, DictionaryResolver, DictionaryStore};
pub use document::{DocumentRepository, DocumentStore};
pub use unit_of_work::{
    finish, participate, with_unit_of_work, Participation, PgUnitOfWorkProvider, UnitOfWork,
    UnitOfWorkProvider,
};
pub use upload::{UploadRepository, UploadStore};
