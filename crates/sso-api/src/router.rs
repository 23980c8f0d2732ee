//! Route definitions for the SSO HTTP API.
//!
//! Auth and health routes are mounted under `/api`; the realtime upgrade
//! lives at `/ws`.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with all routes, threading `AppState` through
/// every route via `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(auth_routes()).merge(health_routes());

    Router::new()
        .route("/", get(handlers::health::welcome))
        .route("/ws", get(handlers::ws::ws_upgrade))
        .nest("/api", api_routes)
        .with_state(state)
}

/// Auth endpoints: register, login, logout, validate, refresh, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/validate", get(handlers::auth::validate))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/me", get(handlers::auth::me))
}

/// Health endpoint
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
