//! Outbound force-logout channel handed to the session authority.

use async_trait::async_trait;

use crate::types::UserId;

/// Delivers force-logout notices to every live connection of a user.
///
/// The session authority receives an implementation at construction time
/// and calls it after purging a user's sessions.
#[async_trait]
pub trait ForceLogoutBroadcaster: Send + Sync {
    /// Notifies all of the user's live connections and drops their bindings.
    ///
    /// Delivery is best-effort and at-most-once. Returns the number of
    /// connections the notice was handed to.
    async fn broadcast_force_logout(&self, user_id: UserId, message: &str) -> usize;
}
