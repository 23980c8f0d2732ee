//! WebSocket connection handles and the user → connections registry.

pub mod handle;
pub mod registry;

pub use handle::ConnectionHandle;
pub use registry::ConnectionRegistry;
