//! Shared domain types.

pub mod id;
pub mod user;

pub use id::{ConnectionId, UserId};
pub use user::UserInfo;
