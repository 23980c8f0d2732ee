//! # sso-realtime
//!
//! Realtime push channel for the SSO authority. Provides:
//!
//! - Per-connection handles with bounded outbound queues
//! - The connection registry mapping a user to their live connections
//! - JSON event types for the `authenticate` handshake and `force-logout`
//! - The gateway that binds connections and delivers force-logout notices

pub mod connection;
pub mod gateway;
pub mod message;

pub use connection::{ConnectionHandle, ConnectionRegistry};
pub use gateway::RealtimeGateway;
pub use message::{InboundMessage, OutboundMessage};
