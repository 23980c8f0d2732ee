//! # sso-core
//!
//! Core crate for the SSO session authority. Contains configuration schemas,
//! typed identifiers, the user projection shared with clients, the traits
//! through which the authority talks to its collaborators, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other SSO crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
