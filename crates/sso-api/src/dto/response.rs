//! Response DTOs.

use serde::{Deserialize, Serialize};

use sso_core::types::UserInfo;

/// Plain message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Login response. Tokens travel in cookies only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Message.
    pub message: String,
    /// The authenticated user.
    pub user: UserInfo,
}

/// Logout response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Message.
    pub message: String,
    /// Realtime connections that were sent a force-logout notice.
    pub logged_out_connections: usize,
}

/// Validation response for both outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether the credentials describe a live session.
    pub valid: bool,
    /// The user, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    /// Failure reason, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Failure message, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Current user response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// The authenticated user.
    pub user: UserInfo,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Open realtime connections.
    pub ws_connections: usize,
    /// Users with at least one bound realtime connection.
    pub online_users: usize,
}
