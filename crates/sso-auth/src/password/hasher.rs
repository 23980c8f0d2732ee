//! Argon2id credential digests for user stores.
//!
//! Digests are kept as PHC strings. A mismatch is `Ok(false)`; a digest that
//! cannot be parsed or checked is a store fault (`ServiceUnavailable`).

use std::fmt;
use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::warn;

use sso_core::error::{AppError, ErrorKind};
use sso_core::result::AppResult;

/// Stored Argon2id digest of one account's password.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// PHC string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// Produces and checks [`PasswordDigest`]s.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Throwaway digest checked for accounts that do not exist.
    decoy: OnceLock<PasswordDigest>,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("algorithm", &"argon2id")
            .finish()
    }
}

impl PasswordHasher {
    /// Argon2id, version 0x13, default cost parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
            decoy: OnceLock::new(),
        }
    }

    /// Digests a password with a fresh random salt.
    pub fn digest(&self, password: &str) -> AppResult<PasswordDigest> {
        if password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                AppError::new(
                    ErrorKind::ServiceUnavailable,
                    format!("Password hashing failed: {e}"),
                )
            })?;

        Ok(PasswordDigest(hash.to_string()))
    }

    /// Checks `password` against a stored digest.
    pub fn matches(&self, password: &str, digest: &PasswordDigest) -> AppResult<bool> {
        let parsed = PasswordHash::new(digest.as_str()).map_err(|e| {
            warn!(error = %e, "Stored password digest is unreadable");
            AppError::new(
                ErrorKind::ServiceUnavailable,
                format!("Stored credential is unreadable: {e}"),
            )
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::new(
                ErrorKind::ServiceUnavailable,
                format!("Password verification failed: {e}"),
            )),
        }
    }

    /// Runs a check against the decoy digest and discards the result.
    ///
    /// Called for unknown accounts so they cost as much as a wrong password.
    pub fn check_decoy(&self, password: &str) {
        if let Some(decoy) = self.decoy() {
            let _ = self.matches(password, decoy);
        }
    }

    fn decoy(&self) -> Option<&PasswordDigest> {
        if let Some(decoy) = self.decoy.get() {
            return Some(decoy);
        }
        let digest = self.digest("decoy-credential").ok()?;
        Some(self.decoy.get_or_init(|| digest))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
