//! Authentication and authorization of API requests

pub mod cache;
pub mod middleware;
pub mod models;

pub use middleware::{auth_middleware, AuthState};
pub use models::{AuthUser, Claims, User};
