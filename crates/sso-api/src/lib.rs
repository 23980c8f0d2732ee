//! # sso-api
//!
//! HTTP API layer for the SSO authority built on Axum.
//!
//! Provides the `/api/auth` endpoints, health reporting, the `/ws` realtime
//! upgrade, cookie credential transport, middleware (CORS, logging),
//! extractors, DTOs, and error mapping.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
