//! User projection shared with client applications.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Public view of a user record. Never carries credentials or sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identity.
    pub id: UserId,
    /// Display username.
    pub username: String,
    /// Login email.
    pub email: String,
}
