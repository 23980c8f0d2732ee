//! Custom Axum extractors.

pub mod auth;
pub mod validated;

pub use auth::{AuthUser, SessionCredentials};
pub use validated::ValidatedJson;
