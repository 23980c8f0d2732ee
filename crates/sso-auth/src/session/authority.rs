//! Session authority: login, validate, refresh, logout-everywhere.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sso_core::config::AppConfig;
use sso_core::error::{AppError, ErrorKind};
use sso_core::result::AppResult;
use sso_core::traits::{CreateUserOutcome, ForceLogoutBroadcaster, UserStore};
use sso_core::types::{UserId, UserInfo};

use crate::jwt::{TokenCodec, TokenPair};
use crate::password::PasswordValidator;

use super::store::SessionStore;

/// Result of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    /// Freshly minted token pair.
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: UserInfo,
}

/// Why a validation attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReason {
    /// No access token was presented.
    NoToken,
    /// The access token failed verification.
    InvalidToken,
    /// The refresh token no longer matches a live session.
    SessionInvalidated,
    /// The token's subject no longer exists.
    UserNotFound,
}

impl InvalidReason {
    /// Wire form reported to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoToken => "no token",
            Self::InvalidToken => "invalid token",
            Self::SessionInvalidated => "session invalidated",
            Self::UserNotFound => "user not found",
        }
    }

    /// Human-readable message accompanying the reason.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoToken => "No token provided",
            Self::InvalidToken => "Invalid or expired token",
            Self::SessionInvalidated => sso_core::error::SESSION_INVALIDATED_MESSAGE,
            Self::UserNotFound => "User not found",
        }
    }

    fn into_error(self) -> AppError {
        match self {
            Self::NoToken => AppError::unauthorized(self.message()),
            Self::InvalidToken => AppError::token_invalid(self.message()),
            Self::SessionInvalidated => AppError::session_invalidated(),
            Self::UserNotFound => AppError::unauthorized(self.message()),
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`SessionAuthority::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Credentials are live.
    Valid {
        /// The authenticated user.
        user: UserInfo,
    },
    /// Credentials are not usable.
    Invalid {
        /// Failure reason.
        reason: InvalidReason,
    },
}

/// Result of a logout-everywhere call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResult {
    /// Identity resolved from the presented tokens, if any.
    pub user_id: Option<UserId>,
    /// Number of session records removed.
    pub cleared_sessions: usize,
    /// Number of realtime connections that were sent a force-logout notice.
    pub logged_out_connections: usize,
}

/// Coordinates the token codec, session store, user store, and the
/// force-logout broadcaster.
#[derive(Clone)]
pub struct SessionAuthority {
    /// Token minting and verification.
    codec: Arc<TokenCodec>,
    /// Per-user session sets.
    sessions: Arc<SessionStore>,
    /// Credential storage.
    users: Arc<dyn UserStore>,
    /// Realtime force-logout channel.
    broadcaster: Arc<dyn ForceLogoutBroadcaster>,
    /// Registration password policy.
    password_validator: PasswordValidator,
    /// Message sent with every force-logout notice.
    force_logout_message: String,
}

impl std::fmt::Debug for SessionAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthority")
            .field("codec", &self.codec)
            .field("users", &self.users)
            .finish()
    }
}

impl SessionAuthority {
    /// Creates a new authority with all collaborators injected.
    pub fn new(
        config: &AppConfig,
        codec: Arc<TokenCodec>,
        sessions: Arc<SessionStore>,
        users: Arc<dyn UserStore>,
        broadcaster: Arc<dyn ForceLogoutBroadcaster>,
    ) -> Self {
        Self {
            codec,
            sessions,
            users,
            broadcaster,
            password_validator: PasswordValidator::new(&config.auth),
            force_logout_message: config.realtime.force_logout_message.clone(),
        }
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Returns the session store.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Authenticates credentials and opens a new session.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResult> {
        let user = self
            .users
            .verify_password(email, password)
            .await
            .map_err(store_unavailable)?
            .ok_or_else(AppError::invalid_credentials)?;

        let tokens = self.codec.issue_pair(user.id)?;
        self.sessions
            .create_session(user.id, &tokens.refresh_token)
            .await;

        info!(user_id = %user.id, "Login successful");

        Ok(LoginResult { tokens, user })
    }

    /// Checks whether the presented credentials still describe a live session.
    ///
    /// Only a user-store outage is an `Err`; every credential problem is an
    /// [`ValidationOutcome::Invalid`].
    pub async fn validate(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> AppResult<ValidationOutcome> {
        match self.resolve_user(access_token, refresh_token).await? {
            Ok(user) => Ok(ValidationOutcome::Valid { user }),
            Err(reason) => {
                debug!(reason = %reason, "Validation failed");
                Ok(ValidationOutcome::Invalid { reason })
            }
        }
    }

    /// Same checks as [`validate`](Self::validate), with failures as errors.
    pub async fn current_user(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> AppResult<UserInfo> {
        self.resolve_user(access_token, refresh_token)
            .await?
            .map_err(InvalidReason::into_error)
    }

    async fn resolve_user(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> AppResult<Result<UserInfo, InvalidReason>> {
        let Some(access_token) = access_token else {
            return Ok(Err(InvalidReason::NoToken));
        };
        let Some(claims) = self.codec.verify_access(access_token) else {
            return Ok(Err(InvalidReason::InvalidToken));
        };
        let user_id = claims.user_id();

        if let Some(refresh_token) = refresh_token {
            if !self.sessions.has_session(user_id, refresh_token).await {
                return Ok(Err(InvalidReason::SessionInvalidated));
            }
        }

        let user = self.users.find(user_id).await.map_err(store_unavailable)?;
        Ok(user.ok_or(InvalidReason::UserNotFound))
    }

    /// Exchanges a live refresh token for a new pair, retiring the old one.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self
            .codec
            .verify_refresh(refresh_token)
            .ok_or_else(|| AppError::token_invalid("Invalid refresh token"))?;
        let user_id = claims.user_id();

        if !self.sessions.has_session(user_id, refresh_token).await {
            warn!(user_id = %user_id, "Refresh with a token that has no live session");
            return Err(AppError::session_invalidated());
        }

        let tokens = self.codec.issue_pair(user_id)?;

        // A concurrent refresh or logout may have won between the check above
        // and here; the rotation is the authoritative test.
        if !self
            .sessions
            .rotate_session(user_id, refresh_token, &tokens.refresh_token)
            .await
        {
            warn!(user_id = %user_id, "Refresh lost a race with another refresh or logout");
            return Err(AppError::session_invalidated());
        }

        info!(user_id = %user_id, "Token refreshed");

        Ok(tokens)
    }

    /// Ends every session of the identity behind the presented tokens and
    /// pushes a force-logout notice to all of its live connections.
    ///
    /// Never fails; without a resolvable identity it does nothing.
    pub async fn logout_everywhere(
        &self,
        refresh_token: Option<&str>,
        access_token: Option<&str>,
    ) -> LogoutResult {
        let user_id = refresh_token
            .and_then(|t| self.codec.identity_ignoring_expiry(t))
            .or_else(|| access_token.and_then(|t| self.codec.identity_ignoring_expiry(t)));

        let Some(user_id) = user_id else {
            debug!("Logout without a resolvable identity");
            return LogoutResult::default();
        };

        let cleared_sessions = self.sessions.clear_all_sessions(user_id).await;
        let logged_out_connections = self
            .broadcaster
            .broadcast_force_logout(user_id, &self.force_logout_message)
            .await;

        info!(
            user_id = %user_id,
            cleared_sessions,
            logged_out_connections,
            "Logged out everywhere"
        );

        LogoutResult {
            user_id: Some(user_id),
            cleared_sessions,
            logged_out_connections,
        }
    }

    /// Creates a new account.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<UserInfo> {
        if username.trim().is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }
        if email.trim().is_empty() {
            return Err(AppError::validation("Email must not be empty"));
        }
        self.password_validator.validate(password)?;

        match self
            .users
            .create(username, email, password)
            .await
            .map_err(store_unavailable)?
        {
            CreateUserOutcome::Created(user) => {
                info!(user_id = %user.id, username = %user.username, "User registered");
                Ok(user)
            }
            CreateUserOutcome::Exists => Err(AppError::user_already_exists()),
        }
    }
}

fn store_unavailable(err: AppError) -> AppError {
    if matches!(err.kind, ErrorKind::ServiceUnavailable | ErrorKind::Validation) {
        return err;
    }
    warn!(error = %err, "User store unavailable");
    AppError::with_source(ErrorKind::ServiceUnavailable, "User store unavailable", err)
}
