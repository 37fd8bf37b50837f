//! # Dudo
//!
//! A multiplayer dice-bluffing game engine built around one actor task
//! per game session.
//!
//! Players join a room by its short numeric code, ready up in the
//! lobby, and then play rounds of accusations over hidden dice rolls
//! until a single player remains. Every mutating event for a session
//! flows through that session's actor inbox, so round resolution,
//! elimination, and ring relinking are atomic from the outside.
//!
//! ## Core Modules
//!
//! - [`game`]: dice rolling, paso detection, accusation scoring, and
//!   the session entities (players, rules, the turn ring)
//! - [`net`]: the framed JSON protocol exchanged with clients
//! - [`session`]: the per-game actor and its handle
//! - [`playground`]: the registry of live games, keyed by room code
//!
//! ## Example
//!
//! ```
//! use dudo::{GameRules, Playground};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let playground = Playground::new();
//! let code = playground.create_game(GameRules::default());
//! assert!(playground.get_game(&code).is_ok());
//! # }
//! ```

/// Dice, scoring, and session entities.
pub mod game;
pub use game::{
    GameError, GameProgression, GameRules,
    dice::{self, AccusationKind, Die, JOKER},
    entities::{Code, GameData, PlayerData},
};

/// Client/server protocol messages and framing.
pub mod net;
pub use net::{
    errors::ProtocolError,
    messages::{ClientEvent, ServerEvent},
};

/// The per-session game actor.
pub mod session;
pub use session::{GameActor, GameClosed, GameHandle, SessionMessage, SessionSnapshot};

/// The registry of live game sessions.
pub mod playground;
pub use playground::{GameNotFound, Playground};
