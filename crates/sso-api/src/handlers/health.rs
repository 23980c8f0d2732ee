//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{HealthResponse, MessageResponse};
use crate::state::AppState;

/// GET /
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new("SSO session authority is running"))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ws_connections: state.gateway.connection_count(),
        online_users: state.gateway.online_user_count(),
    })
}
