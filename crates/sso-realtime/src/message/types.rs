//! Inbound and outbound WebSocket message type definitions.
//!
//! Every frame is a JSON text frame tagged by its `event` field.

use serde::{Deserialize, Serialize};

use sso_core::types::UserId;

/// Codes carried by [`OutboundMessage::Error`].
pub mod error_codes {
    /// The frame was not valid JSON or named an unknown event.
    pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
    /// The connection is no longer registered with the gateway.
    pub const UNKNOWN_CONNECTION: &str = "UNKNOWN_CONNECTION";
}

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// Binds the connection to a user.
    Authenticate {
        /// Claimed identity.
        user_id: UserId,
        /// Access token proving the identity. Required only when the
        /// gateway runs with `require_handshake_token`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Handshake acknowledgement.
    Authenticated {
        /// Identity the connection is now bound to.
        user_id: UserId,
    },
    /// The user's sessions were ended elsewhere; discard local credentials.
    ForceLogout {
        /// Human-readable notice.
        message: String,
    },
    /// Error response.
    Error {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
    },
}

impl InboundMessage {
    /// Parses a text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl OutboundMessage {
    /// Builds an error frame.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Serializes to the JSON text sent over the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_logout_wire_format() {
        let msg = OutboundMessage::ForceLogout {
            message: "bye".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"event": "force-logout", "message": "bye"})
        );
    }

    #[test]
    fn test_authenticate_token_optional() {
        let user_id = UserId::new();
        let parsed =
            InboundMessage::parse(&format!(r#"{{"event":"authenticate","user_id":"{user_id}"}}"#))
                .unwrap();
        assert_eq!(
            parsed,
            InboundMessage::Authenticate {
                user_id,
                token: None
            }
        );

        let parsed = InboundMessage::parse(&format!(
            r#"{{"event":"authenticate","user_id":"{user_id}","token":"t"}}"#
        ))
        .unwrap();
        assert_eq!(
            parsed,
            InboundMessage::Authenticate {
                user_id,
                token: Some("t".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(InboundMessage::parse(r#"{"event":"subscribe"}"#).is_err());
        assert!(InboundMessage::parse("not json").is_err());
        assert!(InboundMessage::parse(r#"{"event":"authenticate","user_id":"nope"}"#).is_err());
    }
}
