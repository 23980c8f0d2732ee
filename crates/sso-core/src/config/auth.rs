//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Development-only signing secret shipped as the default.
pub const DEFAULT_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Longest accepted access token lifetime (7 days).
pub const MAX_ACCESS_TTL_MINUTES: u64 = 7 * 24 * 60;

/// Longest accepted refresh token lifetime (366 days).
pub const MAX_REFRESH_TTL_HOURS: u64 = 366 * 24;

/// Largest accepted clock-skew leeway.
pub const MAX_LEEWAY_SECONDS: u64 = 300;

/// Token signing and credential transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_ttl_hours: u64,
    /// Clock-skew tolerance applied when checking token expiry, in seconds.
    #[serde(default = "default_leeway")]
    pub jwt_leeway_seconds: u64,
    /// Minimum password length accepted at registration.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Whether credential cookies carry the `Secure` attribute.
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_access_ttl_minutes: default_access_ttl(),
            jwt_refresh_ttl_hours: default_refresh_ttl(),
            jwt_leeway_seconds: default_leeway(),
            password_min_length: default_password_min(),
            cookie_secure: false,
        }
    }
}

impl AuthConfig {
    /// Access token lifetime in seconds, clamped to [`MAX_ACCESS_TTL_MINUTES`].
    pub fn access_ttl_seconds(&self) -> i64 {
        (self.jwt_access_ttl_minutes.min(MAX_ACCESS_TTL_MINUTES) * 60) as i64
    }

    /// Refresh token lifetime in seconds, clamped to [`MAX_REFRESH_TTL_HOURS`].
    pub fn refresh_ttl_seconds(&self) -> i64 {
        (self.jwt_refresh_ttl_hours.min(MAX_REFRESH_TTL_HOURS) * 3600) as i64
    }
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_access_ttl() -> u64 {
    60
}

fn default_refresh_ttl() -> u64 {
    7 * 24
}

fn default_leeway() -> u64 {
    5
}

fn default_password_min() -> usize {
    6
}
