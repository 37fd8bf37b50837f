//! The playground: registry of live game sessions keyed by room code.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use thiserror::Error;

use crate::game::{Code, GameRules};
use crate::session::{GameActor, GameHandle};

/// Lookup failure for unknown or already-reaped room codes.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("game {0} not found")]
pub struct GameNotFound(pub Code);

/// Process-wide table of live sessions. Create and lookup are
/// concurrent per-key; there is no global lock to stall unrelated
/// rooms.
#[derive(Default)]
pub struct Playground {
    games: DashMap<Code, GameHandle>,
}

impl Playground {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty lobby session with the given rules and spawns
    /// its actor. Returns the fresh room code, retrying generation
    /// until it lands on one no live session holds. Codes of reaped
    /// sessions are fair game for reuse.
    pub fn create_game(&self, rules: GameRules) -> Code {
        loop {
            let code = generate_code();
            match self.games.entry(code.clone()) {
                Entry::Occupied(mut occupied) => {
                    if !occupied.get().is_closed() {
                        continue;
                    }
                    let (actor, handle) = GameActor::new(code.clone(), rules.clone());
                    occupied.insert(handle);
                    tokio::spawn(actor.run());
                    log::info!("created game {code} over a reaped session");
                    return code;
                }
                Entry::Vacant(vacant) => {
                    let (actor, handle) = GameActor::new(code.clone(), rules.clone());
                    vacant.insert(handle);
                    tokio::spawn(actor.run());
                    log::info!("created game {code}");
                    return code;
                }
            }
        }
    }

    /// Looks up a live session by code. Entries whose actor has exited
    /// are evicted on the way through.
    pub fn get_game(&self, code: &str) -> Result<GameHandle, GameNotFound> {
        let handle = match self.games.get(code) {
            Some(handle) => handle.clone(),
            None => return Err(GameNotFound(code.to_string())),
        };
        if handle.is_closed() {
            self.games.remove(code);
            return Err(GameNotFound(code.to_string()));
        }
        Ok(handle)
    }

    /// Number of sessions whose actors are still running.
    pub fn active_game_count(&self) -> usize {
        self.games.iter().filter(|e| !e.value().is_closed()).count()
    }
}

/// Short numeric room code, 4 digits with leading zeros.
fn generate_code() -> Code {
    format!("{:04}", rand::rng().random_range(0..10_000))
}
