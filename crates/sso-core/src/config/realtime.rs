//! Realtime gateway configuration.

use serde::{Deserialize, Serialize};

/// Realtime (WebSocket) gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound message buffer per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Require the `authenticate` handshake to carry an access token whose
    /// subject matches the claimed user. Off by default: the handshake
    /// trusts the client-asserted identity.
    #[serde(default)]
    pub require_handshake_token: bool,
    /// Message delivered with every `force-logout` event.
    #[serde(default = "default_force_logout_message")]
    pub force_logout_message: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            require_handshake_token: false,
            force_logout_message: default_force_logout_message(),
        }
    }
}

fn default_channel_buffer() -> usize {
    64
}

fn default_force_logout_message() -> String {
    "You have been logged out from another device".to_string()
}
