use thiserror::Error;

/// Errors caused by a client's connection handling rather than its
/// in-game actions. These terminate only the offending connection;
/// the session itself is unaffected.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("invalid user id: {0}")]
    InvalidUserId(String),
    #[error("unknown user")]
    UnknownUser,
}
