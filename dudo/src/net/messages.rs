//! Protocol messages, one JSON object per frame, discriminated by the
//! `event` tag. Unknown tags and malformed payloads are protocol
//! errors that cost the sender its connection.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::errors::ProtocolError;
use crate::game::{AccusationKind, Die, GameRules};

/// A message from a client to its session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The player is ready to start. Idempotent if repeated.
    PlayerReady,
    /// The player is leaving the session. Mid-game this forfeits all
    /// remaining dice.
    PlayerLeave,
    /// An accusation against another player. Only valid from the
    /// current accuser. `dice_value`/`dice_count` carry the claim for
    /// standard and exact accusations; paso has no counted claim.
    Accusation {
        #[serde(rename = "type")]
        kind: AccusationKind,
        accused_player: Uuid,
        #[serde(default)]
        dice_value: Option<Die>,
        #[serde(default)]
        dice_count: Option<usize>,
    },
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::PlayerReady => "ready".to_string(),
            Self::PlayerLeave => "leave".to_string(),
            Self::Accusation {
                kind,
                accused_player,
                ..
            } => format!("{kind} accusation against {accused_player}"),
        };
        write!(f, "{repr}")
    }
}

/// Lobby roster entry: what everyone may see about a player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerPublic {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
}

/// Round roster entry: remaining-die counts only, never hands.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerDiceCount {
    pub id: Uuid,
    pub name: String,
    pub current_dice_count: u8,
}

/// Round-end reveal of one player's full hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerHand {
    pub id: Uuid,
    pub name: String,
    pub dice: Vec<Die>,
}

/// A message from a session to a client.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledgment of the sender's last event: accepted, or
    /// rejected with the violated rule.
    ReadyConfirm {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Targeted at game start: the receiver's ring neighbors.
    PlayerReady {
        ready: bool,
        left_player_id: Option<Uuid>,
        right_player_id: Option<Uuid>,
    },
    /// Lobby roster broadcast after join/ready/leave.
    PlayerUpdate { players: Vec<PlayerPublic> },
    /// The lobby is over; rules are now frozen.
    GameStart { rules: GameRules },
    /// Targeted at each round start: the receiver's own hand plus
    /// everyone's die counts. Other hands stay hidden.
    RoundStart {
        dice: Vec<Die>,
        players: Vec<PlayerDiceCount>,
    },
    /// Broadcast after an accusation resolves. `dice_value` and
    /// `dice_count` echo the claim; `actual_count` and `joker_count`
    /// report what the hands really held; `players` reveals every
    /// hand that was in play this round.
    RoundEnd {
        winner: Uuid,
        loser: Uuid,
        correct_accusation: bool,
        accusation_type: AccusationKind,
        dice_value: Option<Die>,
        dice_count: Option<usize>,
        actual_count: usize,
        joker_count: usize,
        players: Vec<PlayerHand>,
    },
    /// Terminal broadcast: one player remains.
    GameEnd { winner: Uuid },
}

impl ServerEvent {
    pub fn accepted() -> Self {
        Self::ReadyConfirm {
            success: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl fmt::Display) -> Self {
        Self::ReadyConfirm {
            success: false,
            error: Some(reason.to_string()),
        }
    }
}

/// Decodes one inbound frame.
pub fn decode_event(frame: &str) -> Result<ClientEvent, ProtocolError> {
    serde_json::from_str(frame).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
}

/// Encodes one outbound frame.
pub fn encode_event(event: &ServerEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}
