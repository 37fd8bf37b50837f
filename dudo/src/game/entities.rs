//! Session entities: rules, players, and the turn ring.
//!
//! The ring is kept as id-to-id neighbor links on each player rather
//! than references, so relinking during elimination never aliases the
//! player list itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::dice::{self, Die};

/// Short public room code, unique among active sessions.
pub type Code = String;

/// Coarse progression of a session as published to lookups.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameProgression {
    Lobby,
    InGame,
}

impl fmt::Display for GameProgression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "lobby",
            Self::InGame => "in_game",
        };
        write!(f, "{repr}")
    }
}

/// Per-session rules. Immutable once the session leaves the lobby.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct GameRules {
    pub initial_dice_count: u8,
    pub paso_allowed: bool,
    pub exact_allowed: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            initial_dice_count: 5,
            paso_allowed: true,
            exact_allowed: true,
        }
    }
}

/// A seated player. `dice` holds the current round's hidden hand;
/// `current_dice_count` is the authoritative remaining-die count.
#[derive(Clone, Debug)]
pub struct PlayerData {
    pub id: Uuid,
    pub name: String,
    pub dice: Vec<Die>,
    pub current_dice_count: u8,
    pub ready: bool,
    pub left_id: Option<Uuid>,
    pub right_id: Option<Uuid>,
}

impl PlayerData {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            dice: Vec::new(),
            current_dice_count: 0,
            ready: false,
            left_id: None,
            right_id: None,
        }
    }

    /// Rerolls the hand, sized to the remaining-die count.
    pub fn roll_dice(&mut self) {
        self.dice = dice::roll_hand(self.current_dice_count as usize);
    }

    /// A player with no dice left is out of the ring.
    pub fn is_active(&self) -> bool {
        self.current_dice_count > 0
    }
}

/// State of one room. Exclusively owned by its session actor; nothing
/// else mutates it.
#[derive(Debug)]
pub struct GameData {
    pub code: Code,
    pub progression: GameProgression,
    pub rules: GameRules,
    /// Players in join order. Eliminated players stay listed with a
    /// zero die count; players that leave are removed outright.
    pub players: Vec<PlayerData>,
}

impl GameData {
    pub fn new(code: Code, rules: GameRules) -> Self {
        Self {
            code,
            progression: GameProgression::Lobby,
            rules,
            players: Vec::new(),
        }
    }

    pub fn player(&self, id: Uuid) -> Option<&PlayerData> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: Uuid) -> Option<&mut PlayerData> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains_player(&self, id: Uuid) -> bool {
        self.player(id).is_some()
    }

    /// Seats a player, or returns the existing seat on reconnect.
    pub fn add_player(&mut self, id: Uuid, name: &str) -> &mut PlayerData {
        let pos = match self.players.iter().position(|p| p.id == id) {
            Some(pos) => pos,
            None => {
                self.players.push(PlayerData::new(id, name));
                self.players.len() - 1
            }
        };
        &mut self.players[pos]
    }

    pub fn remove_player(&mut self, id: Uuid) -> Option<PlayerData> {
        let pos = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.remove(pos))
    }

    pub fn active_players(&self) -> impl Iterator<Item = &PlayerData> {
        self.players.iter().filter(|p| p.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    pub fn all_ready(&self) -> bool {
        self.players.iter().all(|p| p.ready)
    }

    /// Links every active player into a single cycle in join order.
    pub fn link_ring(&mut self) {
        let ids: Vec<Uuid> = self.active_players().map(|p| p.id).collect();
        let n = ids.len();
        if n == 0 {
            return;
        }
        for (i, &id) in ids.iter().enumerate() {
            let left = ids[(i + n - 1) % n];
            let right = ids[(i + 1) % n];
            if let Some(player) = self.player_mut(id) {
                player.left_id = Some(left);
                player.right_id = Some(right);
            }
        }
    }

    /// Removes a player from the ring, joining its neighbors directly.
    /// The remaining active players still form a single cycle.
    pub fn unlink_player(&mut self, id: Uuid) {
        let Some(player) = self.player(id) else {
            return;
        };
        let (left, right) = (player.left_id, player.right_id);
        if let (Some(left), Some(right)) = (left, right)
            && left != id
        {
            if let Some(neighbor) = self.player_mut(left) {
                neighbor.right_id = Some(right);
            }
            if let Some(neighbor) = self.player_mut(right) {
                neighbor.left_id = Some(left);
            }
        }
        if let Some(player) = self.player_mut(id) {
            player.left_id = None;
            player.right_id = None;
        }
    }

    /// Walks the ring rightwards from `start` until it loops back.
    /// Returns `None` on a broken link, which would be a bug.
    pub fn ring_order(&self, start: Uuid) -> Option<Vec<Uuid>> {
        let mut order = vec![start];
        let mut current = self.player(start)?.right_id?;
        while current != start {
            if order.len() > self.players.len() {
                return None;
            }
            order.push(current);
            current = self.player(current)?.right_id?;
        }
        Some(order)
    }

    /// Rerolls every active player's hand for a new round.
    pub fn roll_all(&mut self) {
        for player in self.players.iter_mut().filter(|p| p.is_active()) {
            player.roll_dice();
        }
    }
}
