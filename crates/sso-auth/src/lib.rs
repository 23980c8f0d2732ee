//! # sso-auth
//!
//! Token issuance, session tracking, and the session authority.
//!
//! ## Modules
//!
//! - `jwt`: signed access/refresh token minting and fail-closed verification
//! - `password`: Argon2id password hashing and registration policy
//! - `session`: per-user session store, the session authority, and cleanup
//! - `user`: in-memory user store used by the server binary and tests

pub mod jwt;
pub mod password;
pub mod session;
pub mod user;

pub use jwt::{Claims, TokenCodec, TokenPair, TokenType};
pub use password::{PasswordHasher, PasswordValidator};
pub use session::{
    InvalidReason, LoginResult, LogoutResult, SessionAuthority, SessionCleanup, SessionStore,
    ValidationOutcome,
};
pub use user::InMemoryUserStore;
