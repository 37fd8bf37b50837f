use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recoverable rule violations. These are reported back to the sender
/// as a negative acknowledgment and never change session state.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("game already in progress")]
    GameInProgress,
    #[error("game has finished")]
    GameFinished,
    #[error("game has not started")]
    NotInGame,
    #[error("need 2+ players")]
    NotEnoughPlayers,
    #[error("not your turn")]
    OutOfTurnAccusation,
    #[error("player does not exist")]
    UnknownPlayer,
    #[error("player has no dice left")]
    PlayerNotActive,
    #[error("paso accusations are disabled")]
    PasoDisabled,
    #[error("exact accusations are disabled")]
    ExactDisabled,
    #[error("accusation needs a dice value and count")]
    MissingClaim,
    #[error("dice value must be between 1 and 6")]
    InvalidDiceValue,
}
