//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `SSO__`-prefixed environment variables. Each sub-module
//! represents a logical configuration section.

pub mod app;
pub mod auth;
pub mod logging;
pub mod realtime;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Prefix for environment variable overrides (`SSO__AUTH__JWT_SECRET`, ...).
const ENV_PREFIX: &str = "SSO";

/// Root application configuration.
///
/// Every section has serde defaults, so an empty configuration source
/// yields a runnable development setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token signing and credential transport settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session store maintenance settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Realtime gateway settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the named environment.
    ///
    /// Merges `config/default`, an environment overlay `config/{env}`, and
    /// environment variables prefixed with `SSO__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(Self::env_source())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Load configuration from an explicit file path plus environment overrides.
    pub fn load_from(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(Self::env_source())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Rejects settings that would make the authority unsafe to run.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.auth.jwt_access_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "auth.jwt_access_ttl_minutes must be positive",
            ));
        }
        if self.auth.jwt_access_ttl_minutes > auth::MAX_ACCESS_TTL_MINUTES {
            return Err(AppError::configuration(format!(
                "auth.jwt_access_ttl_minutes must be at most {}",
                auth::MAX_ACCESS_TTL_MINUTES
            )));
        }
        if self.auth.jwt_refresh_ttl_hours > auth::MAX_REFRESH_TTL_HOURS {
            return Err(AppError::configuration(format!(
                "auth.jwt_refresh_ttl_hours must be at most {}",
                auth::MAX_REFRESH_TTL_HOURS
            )));
        }
        if self.auth.jwt_leeway_seconds > auth::MAX_LEEWAY_SECONDS {
            return Err(AppError::configuration(format!(
                "auth.jwt_leeway_seconds must be at most {}",
                auth::MAX_LEEWAY_SECONDS
            )));
        }
        if self.auth.refresh_ttl_seconds() <= self.auth.access_ttl_seconds() {
            return Err(AppError::configuration(
                "auth.jwt_refresh_ttl_hours must outlive the access token TTL",
            ));
        }
        if self.realtime.channel_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.channel_buffer_size must be positive",
            ));
        }
        Ok(())
    }

    fn env_source() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }
}
