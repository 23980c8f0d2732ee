//! Application builder: wires router, middleware, and state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use sso_auth::session::SessionCleanup;
use sso_auth::user::InMemoryUserStore;
use sso_core::config::AppConfig;
use sso_core::error::AppError;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the SSO server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    config.validate()?;

    tracing::info!("Starting SSO session authority...");

    let users = Arc::new(InMemoryUserStore::new());
    let state = AppState::new(config.clone(), users);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let cleanup_handle = if config.session.cleanup_interval_minutes > 0 {
        let interval = Duration::from_secs(config.session.cleanup_interval_minutes * 60);
        tracing::info!(
            interval_minutes = config.session.cleanup_interval_minutes,
            "Session cleanup enabled"
        );
        Some(SessionCleanup::new(Arc::clone(state.sessions()), interval).spawn(shutdown_rx))
    } else {
        None
    };

    let app = build_app(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("SSO server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(handle) = cleanup_handle {
        let _ = handle.await;
    }

    tracing::info!("SSO server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
