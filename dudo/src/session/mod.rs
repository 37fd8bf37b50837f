//! Per-session game actor.
//!
//! One actor task owns one [`crate::game::GameData`]; every mutating
//! event reaches it through a single inbox and is applied in arrival
//! order, so multi-step transitions look atomic from outside.

pub mod actor;
pub mod messages;

pub use actor::{GameActor, GameHandle};
pub use messages::{GameClosed, SessionMessage, SessionSnapshot};
