//! JWT token encoding, verification, and claims.

pub mod claims;
pub mod codec;

pub use claims::{Claims, TokenType};
pub use codec::{TokenCodec, TokenPair};
