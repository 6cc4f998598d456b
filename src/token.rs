//! Access token value type, redacted secret wrapper, and the compact token codec.

pub mod codec;

mod record;
mod secret;

pub use codec::Claims;
pub use record::*;
pub use secret::*;
