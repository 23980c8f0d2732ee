//! User-record store consumed by the session authority.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{UserId, UserInfo};

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserOutcome {
    /// The user was created.
    Created(UserInfo),
    /// A user with the same username or email already exists.
    Exists,
}

/// Credential storage and lookup.
///
/// Implementations own password hashing. An `Err` of kind `Validation`
/// rejects the input; any other `Err` means the store itself is unreachable
/// and is surfaced as `ServiceUnavailable`. Expected negatives (unknown email,
/// wrong password) are `Ok(None)`.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Returns the user when `password` matches the account for `email`.
    async fn verify_password(&self, email: &str, password: &str) -> AppResult<Option<UserInfo>>;

    /// Creates a user unless the username or email is taken.
    async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<CreateUserOutcome>;

    /// Looks up a user by identity.
    async fn find(&self, id: UserId) -> AppResult<Option<UserInfo>>;
}
