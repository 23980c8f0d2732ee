//! Client error types.

use thiserror::Error;

/// Errors returned by [`SessionClient`](crate::SessionClient) and the watcher.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Realtime channel failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The authority answered with an error body.
    #[error("API error ({status}): {error}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code.
        error: String,
        /// Human-readable message.
        message: String,
    },

    /// Malformed JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The base URL cannot be turned into a realtime URL.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Returns `true` when the authority reported the session revoked.
    pub fn is_session_invalidated(&self) -> bool {
        matches!(self, Self::Api { error, .. } if error == "SESSION_INVALIDATED")
    }
}

/// Convenience alias.
pub type ClientResult<T> = Result<T, ClientError>;
