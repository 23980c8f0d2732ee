//! WebSocket upgrade handler.
//!
//! The upgrade itself is unauthenticated; a connection only becomes
//! addressable once it completes the `authenticate` handshake.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// How long queued frames may take to flush after the client went away.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// GET /ws (WebSocket upgrade)
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.gateway.on_connect();
    let conn_id = handle.id;

    info!(conn_id = %conn_id, "WebSocket connection established");

    // Spawn outbound message forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match msg.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!(conn_id = %conn_id, error = %e, "Failed to serialize outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Process inbound messages
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.gateway.handle_inbound(conn_id, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    state.gateway.on_disconnect(conn_id).await;
    drop(handle);

    // The gateway dropped its sender; let the forwarder flush what is queued.
    let abort = outbound_task.abort_handle();
    match tokio::time::timeout(FLUSH_TIMEOUT, outbound_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(conn_id = %conn_id, error = %e, "Outbound forwarder ended abnormally"),
        Err(_) => abort.abort(),
    }

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
