//! Signed, time-bounded token minting and verification.
//!
//! Tokens are HS256 JWTs. Verification fails closed: malformed, unsigned,
//! wrongly signed, wrong-type, and expired tokens all come back as `None`.
//! Expiry is checked against wall-clock time with a fixed leeway taken from
//! `auth.jwt_leeway_seconds`, so a token is rejected once
//! `now > exp + leeway`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use sso_core::config::AuthConfig;
use sso_core::config::auth::MAX_LEEWAY_SECONDS;
use sso_core::error::AppError;
use sso_core::types::UserId;

use super::claims::{Claims, TokenType};

/// Mints and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation with expiry checking.
    validation: Validation,
    /// Validation that still checks the signature but ignores expiry.
    stale_validation: Validation,
    /// Access token lifetime.
    access_ttl: Duration,
    /// Refresh token lifetime.
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenCodec {
    /// Creates a codec from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.jwt_leeway_seconds.min(MAX_LEEWAY_SECONDS);

        let mut stale_validation = validation.clone();
        stale_validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            stale_validation,
            access_ttl: Duration::seconds(config.access_ttl_seconds()),
            refresh_ttl: Duration::seconds(config.refresh_ttl_seconds()),
        }
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Signs an access token for the user.
    pub fn issue_access_token(&self, user_id: UserId) -> Result<String, AppError> {
        self.issue_at(user_id, TokenType::Access, Utc::now())
            .map(|(token, _)| token)
    }

    /// Signs a refresh token for the user.
    pub fn issue_refresh_token(&self, user_id: UserId) -> Result<String, AppError> {
        self.issue_at(user_id, TokenType::Refresh, Utc::now())
            .map(|(token, _)| token)
    }

    /// Signs a fresh access + refresh pair.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let (access_token, access_expires_at) = self.issue_at(user_id, TokenType::Access, now)?;
        let (refresh_token, refresh_expires_at) =
            self.issue_at(user_id, TokenType::Refresh, now)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Signs a token as if issued at `issued_at`.
    pub(crate) fn issue_at(
        &self,
        user_id: UserId,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let expires_at = issued_at + ttl;

        let claims = Claims {
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok((token, expires_at))
    }

    /// Verifies signature and expiry. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Token rejected");
                None
            }
        }
    }

    /// Verifies a token and requires it to be an access token.
    pub fn verify_access(&self, token: &str) -> Option<Claims> {
        self.verify(token)
            .filter(|claims| claims.token_type == TokenType::Access)
    }

    /// Verifies a token and requires it to be a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Option<Claims> {
        self.verify(token)
            .filter(|claims| claims.token_type == TokenType::Refresh)
    }

    /// Resolves the subject of an authentic token even after it expired.
    ///
    /// Only used to find whose sessions to purge on logout; the signature is
    /// still checked.
    pub fn identity_ignoring_expiry(&self, token: &str) -> Option<UserId> {
        decode::<Claims>(token, &self.decoding_key, &self.stale_validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}
