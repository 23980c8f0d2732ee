//! Session tracking, the session authority, and periodic cleanup.

pub mod authority;
pub mod cleanup;
pub mod store;

pub use authority::{InvalidReason, LoginResult, LogoutResult, SessionAuthority, ValidationOutcome};
pub use cleanup::SessionCleanup;
pub use store::{SessionRecord, SessionStore};
