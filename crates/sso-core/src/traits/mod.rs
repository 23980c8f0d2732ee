//! Traits at the seams between the session authority and its collaborators.

pub mod broadcaster;
pub mod user_store;

pub use broadcaster::ForceLogoutBroadcaster;
pub use user_store::{CreateUserOutcome, UserStore};
