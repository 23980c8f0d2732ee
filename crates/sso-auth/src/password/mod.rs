//! Password hashing and registration policy.

pub mod hasher;
pub mod validator;

pub use hasher::{PasswordDigest, PasswordHasher};
pub use validator::PasswordValidator;
