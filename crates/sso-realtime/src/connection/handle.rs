//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::warn;

use sso_core::types::{ConnectionId, UserId};

use crate::message::OutboundMessage;

/// A handle to a single WebSocket connection.
///
/// Holds the sender half of the connection's outbound queue plus the
/// identity the connection is currently bound to, if any.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound messages
    sender: mpsc::Sender<OutboundMessage>,
    /// Identity bound by the last successful handshake
    bound_user: RwLock<Option<UserId>>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new, unbound connection handle
    pub fn new(sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
            bound_user: RwLock::new(None),
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Queue an outbound message. Never blocks; returns `false` when the
    /// message was dropped.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Send buffer full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.sender.is_closed()
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Identity the connection is bound to.
    pub async fn bound_user(&self) -> Option<UserId> {
        *self.bound_user.read().await
    }

    /// Binds the connection to `user_id`, returning the previous binding.
    pub async fn bind(&self, user_id: UserId) -> Option<UserId> {
        self.bound_user.write().await.replace(user_id)
    }

    /// Clears the binding if it still points at `user_id`.
    pub async fn unbind_if(&self, user_id: UserId) -> bool {
        let mut bound = self.bound_user.write().await;
        if *bound == Some(user_id) {
            *bound = None;
            true
        } else {
            false
        }
    }

    /// Clears the binding unconditionally, returning what it was.
    pub async fn take_binding(&self) -> Option<UserId> {
        self.bound_user.write().await.take()
    }
}
