//! Session actor message types.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::game::{Code, GameError, GameProgression, GameRules};
use crate::net::messages::{PlayerPublic, ServerEvent};

/// The actor's inbox vanished, meaning the session was reaped.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("game is closed")]
pub struct GameClosed;

/// Messages that can be sent to a [`super::GameActor`].
#[derive(Debug)]
pub enum SessionMessage {
    /// A connection opened for this player. Seats the player in the
    /// lobby (or re-attaches a reconnecting seat) and registers the
    /// outbound channel.
    Connect {
        user_id: Uuid,
        name: String,
        sender: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// The player's connection dropped. Not the same as leaving: the
    /// actor applies the disconnect policy for the current phase.
    Disconnect { user_id: Uuid },

    /// A decoded protocol event from a connected player.
    Event {
        user_id: Uuid,
        event: crate::net::messages::ClientEvent,
    },

    /// Published-state snapshot for lookup endpoints.
    Snapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },

    /// Whether the user currently holds a seat.
    IsSeated {
        user_id: Uuid,
        response: oneshot::Sender<bool>,
    },
}

/// Narrowed session state published to lookups: never any dice.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SessionSnapshot {
    pub code: Code,
    pub progression: GameProgression,
    pub rules: GameRules,
    pub players: Vec<PlayerPublic>,
}
