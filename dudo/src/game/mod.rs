//! Core game logic: dice scoring and session entities.

pub mod dice;
pub mod entities;
mod errors;

pub use dice::{AccusationKind, Die, JOKER, Resolution};
pub use entities::{Code, GameData, GameProgression, GameRules, PlayerData};
pub use errors::GameError;
