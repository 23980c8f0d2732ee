//! Credential extractors.
//!
//! Tokens are read from the `accessToken`/`refreshToken` cookies. The access
//! token may also arrive as `Authorization: Bearer <token>` for non-browser
//! clients; the cookie wins when both are present.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use sso_core::types::UserInfo;

use crate::cookies::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// Raw tokens presented with a request. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    /// Access token, if presented.
    pub access_token: Option<String>,
    /// Refresh token, if presented.
    pub refresh_token: Option<String>,
}

impl SessionCredentials {
    /// Reads credentials from request headers.
    pub fn from_parts(parts: &Parts) -> Self {
        let jar = CookieJar::from_headers(&parts.headers);

        let cookie = |name: &str| {
            jar.get(name)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty())
        };

        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from);

        Self {
            access_token: cookie(ACCESS_COOKIE).or(bearer),
            refresh_token: cookie(REFRESH_COOKIE),
        }
    }

    /// Access token as `&str`.
    pub fn access(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Refresh token as `&str`.
    pub fn refresh(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionCredentials {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// The authenticated user behind the request's credentials.
///
/// Rejects with 401 unless the access token verifies and, when a refresh
/// token is presented, it still matches a live session.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

impl std::ops::Deref for AuthUser {
    type Target = UserInfo;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credentials = SessionCredentials::from_parts(parts);
        let user = state
            .authority
            .current_user(credentials.access(), credentials.refresh())
            .await?;
        Ok(AuthUser(user))
    }
}
