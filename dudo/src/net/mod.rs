//! Wire protocol: framed JSON events exchanged with clients.

pub mod errors;
pub mod messages;

pub use errors::ProtocolError;
pub use messages::{ClientEvent, PlayerDiceCount, PlayerHand, PlayerPublic, ServerEvent};
