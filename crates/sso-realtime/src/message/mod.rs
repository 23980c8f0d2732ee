//! Realtime message definitions.

pub mod types;

pub use types::{InboundMessage, OutboundMessage, error_codes};
