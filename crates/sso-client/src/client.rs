//! HTTP client for the `/api/auth` endpoints.
//!
//! The underlying `reqwest` client keeps a cookie store, so the credential
//! cookies set by `login` and `refresh` are replayed automatically.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use sso_core::types::UserInfo;

use crate::error::{ClientError, ClientResult};

/// Result of asking the authority whether the session is still live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationState {
    /// The session is live.
    Valid(UserInfo),
    /// The session is not usable.
    Invalid {
        /// Reason code (`no token`, `invalid token`, `session invalidated`, ...).
        reason: String,
        /// Human-readable message.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ValidateBody {
    valid: bool,
    user: Option<UserInfo>,
    reason: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    user: UserInfo,
}

#[derive(Debug, Deserialize)]
struct LogoutBody {
    logged_out_connections: usize,
}

/// Cookie-holding client for one user agent.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
}

impl SessionClient {
    /// Creates a client for the authority at `base_url` (e.g.
    /// `http://localhost:4000`).
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::with_cookie_jar(base_url, Arc::new(Jar::default()))
    }

    /// Creates a client that reads and writes credentials through `jar`,
    /// e.g. one shared with the embedding application.
    pub fn with_cookie_jar(base_url: impl Into<String>, jar: Arc<Jar>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The realtime endpoint derived from the base URL.
    pub fn ws_url(&self) -> ClientResult<String> {
        if let Some(rest) = self.base_url.strip_prefix("https://") {
            Ok(format!("wss://{rest}/ws"))
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            Ok(format!("ws://{rest}/ws"))
        } else {
            Err(ClientError::InvalidUrl(self.base_url.clone()))
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/auth{}", self.base_url, path)
    }

    /// Creates an account.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(self.url("/register"))
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await?;
        handle_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Logs in; the credential cookies are stored for later calls.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<UserInfo> {
        let response = self
            .http
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: UserBody = handle_response(response).await?;
        debug!(user_id = %body.user.id, "Logged in");
        Ok(body.user)
    }

    /// Logs out everywhere. Returns how many realtime connections were told.
    pub async fn logout(&self) -> ClientResult<usize> {
        let response = self.http.post(self.url("/logout")).send().await?;
        let body: LogoutBody = handle_response(response).await?;
        Ok(body.logged_out_connections)
    }

    /// Checks whether the stored credentials still describe a live session.
    pub async fn validate(&self) -> ClientResult<ValidationState> {
        let response = self.http.get(self.url("/validate")).send().await?;
        let status = response.status();

        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            let body: ValidateBody = response.json().await?;
            return Ok(match (body.valid, body.user) {
                (true, Some(user)) => ValidationState::Valid(user),
                _ => ValidationState::Invalid {
                    reason: body.reason.unwrap_or_default(),
                    message: body.message.unwrap_or_default(),
                },
            });
        }

        Err(api_error(response).await)
    }

    /// Rotates the refresh cookie.
    pub async fn refresh(&self) -> ClientResult<()> {
        let response = self.http.post(self.url("/refresh")).send().await?;
        handle_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Returns the current user.
    pub async fn me(&self) -> ClientResult<UserInfo> {
        let response = self.http.get(self.url("/me")).send().await?;
        let body: UserBody = handle_response(response).await?;
        Ok(body.user)
    }
}

/// Handles a response with a body.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ClientError::Api {
            status,
            error: body.error,
            message: body.message,
        },
        Err(_) => ClientError::Api {
            status,
            error: "UNKNOWN".to_string(),
            message: text,
        },
    }
}
