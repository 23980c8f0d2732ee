//! Credential cookies.
//!
//! Both tokens travel as HTTP-only cookies scoped to `/` with
//! `SameSite=Lax`; `Secure` is added when `auth.cookie_secure` is set.

use axum_extra::extract::cookie::{Cookie, CookieJar};

use sso_auth::jwt::TokenPair;
use sso_core::config::AuthConfig;
use sso_core::error::AppError;

/// Name of the access token cookie.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Name of the refresh token cookie.
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(
    name: &str,
    value: &str,
    max_age_seconds: i64,
    secure: bool,
) -> Result<Cookie<'static>, AppError> {
    let secure_flag = if secure { " Secure;" } else { "" };
    let raw = format!(
        "{name}={value}; Path=/; HttpOnly; SameSite=Lax;{secure_flag} Max-Age={max_age_seconds}"
    );
    Cookie::parse(raw).map_err(|e| AppError::internal(format!("Failed to build cookie: {e}")))
}

/// Adds both credential cookies for a freshly minted pair.
pub fn set_session_cookies(
    jar: CookieJar,
    tokens: &TokenPair,
    config: &AuthConfig,
) -> Result<CookieJar, AppError> {
    let access_max_age = config.access_ttl_seconds();
    let refresh_max_age = config.refresh_ttl_seconds();

    Ok(jar
        .add(session_cookie(
            ACCESS_COOKIE,
            &tokens.access_token,
            access_max_age,
            config.cookie_secure,
        )?)
        .add(session_cookie(
            REFRESH_COOKIE,
            &tokens.refresh_token,
            refresh_max_age,
            config.cookie_secure,
        )?))
}

/// Expires both credential cookies.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie(ACCESS_COOKIE, "abc", 3600, true).unwrap();
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age().map(|d| d.whole_seconds()),
            Some(3600)
        );
    }

    #[test]
    fn test_insecure_by_default() {
        let cookie = session_cookie(REFRESH_COOKIE, "r", 60, false).unwrap();
        assert_eq!(cookie.secure(), None);
    }
}
