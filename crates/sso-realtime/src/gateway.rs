//! Realtime gateway: connection lifecycle, the `authenticate` handshake,
//! and force-logout delivery.
//!
//! A connection starts unbound. The handshake binds it to a user in the
//! [`ConnectionRegistry`]; by default the claimed identity is taken at face
//! value, and with `realtime.require_handshake_token` the frame must carry an
//! access token whose subject matches the claim.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sso_auth::jwt::TokenCodec;
use sso_core::config::RealtimeConfig;
use sso_core::error::AppError;
use sso_core::traits::ForceLogoutBroadcaster;
use sso_core::types::{ConnectionId, UserId};

use crate::connection::{ConnectionHandle, ConnectionRegistry};
use crate::message::{InboundMessage, OutboundMessage, error_codes};

/// Accepts realtime connections and relays force-logout notices.
#[derive(Debug)]
pub struct RealtimeGateway {
    /// Every open connection, bound or not.
    connections: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Bound connections by user.
    registry: Arc<ConnectionRegistry>,
    /// Verifies handshake tokens in hardened mode.
    codec: Arc<TokenCodec>,
    /// Realtime configuration.
    config: RealtimeConfig,
}

impl RealtimeGateway {
    /// Creates a gateway with an empty registry.
    pub fn new(config: RealtimeConfig, codec: Arc<TokenCodec>) -> Self {
        Self {
            connections: DashMap::new(),
            registry: Arc::new(ConnectionRegistry::new()),
            codec,
            config,
        }
    }

    /// Returns the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Registers a new, unauthenticated connection.
    pub fn on_connect(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(tx));
        self.connections.insert(handle.id, handle.clone());

        debug!(conn_id = %handle.id, "Connection registered");

        (handle, rx)
    }

    /// Binds a connection to `claimed`, moving any earlier binding.
    ///
    /// Acknowledges with an `authenticated` event on success.
    pub async fn on_authenticate_handshake(
        &self,
        conn_id: ConnectionId,
        claimed: UserId,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let handle = self
            .connections
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::validation("Unknown connection"))?;

        if self.config.require_handshake_token {
            let subject = token
                .and_then(|t| self.codec.verify_access(t))
                .map(|claims| claims.user_id());
            if subject != Some(claimed) {
                warn!(conn_id = %conn_id, user_id = %claimed, "Handshake token does not prove identity");
                return Err(AppError::unauthorized("Handshake token does not match user"));
            }
        }

        if let Some(previous) = handle.bind(claimed).await {
            if previous != claimed {
                self.registry.unbind(previous, conn_id);
                debug!(conn_id = %conn_id, from = %previous, to = %claimed, "Connection rebound");
            }
        }
        self.registry.bind(claimed, handle.clone());

        info!(conn_id = %conn_id, user_id = %claimed, "Connection authenticated");

        handle.send(OutboundMessage::Authenticated { user_id: claimed });
        Ok(())
    }

    /// Dispatches a text frame received on `conn_id`. Malformed frames and
    /// rejected handshakes are answered with an `error` event.
    pub async fn handle_inbound(&self, conn_id: ConnectionId, text: &str) {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "Invalid inbound frame");
                self.reply(
                    conn_id,
                    OutboundMessage::error(error_codes::INVALID_MESSAGE, e.to_string()),
                );
                return;
            }
        };

        match message {
            InboundMessage::Authenticate { user_id, token } => {
                if let Err(e) = self
                    .on_authenticate_handshake(conn_id, user_id, token.as_deref())
                    .await
                {
                    let code = if self.connections.contains_key(&conn_id) {
                        e.kind.to_string()
                    } else {
                        error_codes::UNKNOWN_CONNECTION.to_string()
                    };
                    self.reply(conn_id, OutboundMessage::error(code, e.message));
                }
            }
        }
    }

    fn reply(&self, conn_id: ConnectionId, msg: OutboundMessage) {
        if let Some(handle) = self.connections.get(&conn_id) {
            handle.send(msg);
        }
    }

    /// Forgets a closed connection. No-op when it is already gone.
    pub async fn on_disconnect(&self, conn_id: ConnectionId) {
        let Some((_, handle)) = self.connections.remove(&conn_id) else {
            return;
        };
        handle.mark_dead();

        let unbound = match handle.take_binding().await {
            Some(user_id) => self.registry.unbind(user_id, conn_id),
            None => false,
        };
        // A force-logout racing a re-handshake can clear the handle's binding
        // after the registry entry was re-added.
        if !unbound && self.registry.unbind_everywhere(conn_id) > 0 {
            debug!(conn_id = %conn_id, "Removed stale registry binding");
        }

        debug!(conn_id = %conn_id, "Connection closed");
    }

    /// Sends `force-logout` to every connection bound to the user and clears
    /// the user's registry entry. Returns the number of connections reached.
    pub async fn broadcast_force_logout(&self, user_id: UserId, message: &str) -> usize {
        let handles = self.registry.remove_user(user_id);
        let mut delivered = 0;

        for handle in &handles {
            handle.unbind_if(user_id).await;
            let sent = handle.send(OutboundMessage::ForceLogout {
                message: message.to_string(),
            });
            if sent {
                delivered += 1;
            } else {
                debug!(conn_id = %handle.id, user_id = %user_id, "Force-logout not delivered");
            }
        }

        info!(
            user_id = %user_id,
            bound = handles.len(),
            delivered,
            "Force-logout broadcast"
        );

        delivered
    }

    /// Number of open connections, bound or not.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of users with at least one bound connection.
    pub fn online_user_count(&self) -> usize {
        self.registry.user_count()
    }
}

#[async_trait]
impl ForceLogoutBroadcaster for RealtimeGateway {
    async fn broadcast_force_logout(&self, user_id: UserId, message: &str) -> usize {
        RealtimeGateway::broadcast_force_logout(self, user_id, message).await
    }
}
