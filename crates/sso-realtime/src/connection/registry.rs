//! Connection registry: live connections indexed by bound user.

use std::sync::Arc;

use dashmap::DashMap;

use sso_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// Thread-safe map from a user to every connection bound to them.
///
/// Sets never linger empty: the entry is dropped together with its last
/// connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// User ID → list of connection handles (one user can have multiple connections).
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the user's set. Binding the same connection
    /// twice is a no-op.
    pub fn bind(&self, user_id: UserId, handle: Arc<ConnectionHandle>) {
        let mut connections = self.by_user.entry(user_id).or_default();
        if !connections.iter().any(|c| c.id == handle.id) {
            connections.push(handle);
        }
    }

    /// Removes a connection from the user's set. Returns whether it was there.
    pub fn unbind(&self, user_id: UserId, conn_id: ConnectionId) -> bool {
        let removed = match self.by_user.get_mut(&user_id) {
            Some(mut connections) => {
                let before = connections.len();
                connections.retain(|c| c.id != conn_id);
                connections.len() < before
            }
            None => return false,
        };

        self.by_user
            .remove_if(&user_id, |_, connections| connections.is_empty());
        removed
    }

    /// Removes a connection from whichever users still hold it. Returns how
    /// many entries it was removed from.
    pub fn unbind_everywhere(&self, conn_id: ConnectionId) -> usize {
        let mut removed = 0;
        self.by_user.retain(|_, connections| {
            let before = connections.len();
            connections.retain(|c| c.id != conn_id);
            removed += before - connections.len();
            !connections.is_empty()
        });
        removed
    }

    /// Snapshot of the user's connections.
    pub fn connections_for(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Removes and returns all connections for a user in one step.
    pub fn remove_user(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .remove(&user_id)
            .map(|(_, connections)| connections)
            .unwrap_or_default()
    }

    /// Total number of bound connections.
    pub fn connection_count(&self) -> usize {
        self.by_user.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of users with at least one bound connection.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}
