//! # sso-client
//!
//! What a relying application runs to stay in sync with the SSO authority:
//! an HTTP client that keeps the credential cookies, and a watcher that
//! re-validates on a fixed interval and listens on the realtime channel for
//! `force-logout`.

pub mod client;
pub mod error;
pub mod watcher;

pub use client::{SessionClient, ValidationState};
pub use error::{ClientError, ClientResult};
pub use watcher::{SessionState, SessionWatcher};
