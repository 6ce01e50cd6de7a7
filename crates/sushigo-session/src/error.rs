//! Error types for the session layer.

use sushigo_protocol::GameId;

use crate::Status;

/// An attempted [`SessionState`](crate::SessionState) transition that is
/// not legal.
///
/// These are invariant breaches: either the server sent something the
/// protocol doesn't allow at this point, or the engine called the wrong
/// transition. Either way the session can't be trusted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// The transition doesn't apply to the current status.
    #[error("{operation} is not legal while {status}")]
    IllegalTransition {
        operation: &'static str,
        status: Status,
    },

    /// A rejoin was attempted before the server ever issued a token.
    #[error("cannot rejoin: no rejoin token has been issued")]
    NoIdentity,

    /// The server rejoined us into a different game.
    #[error("rejoined game {got}, but this session belongs to {expected}")]
    GameMismatch { expected: GameId, got: GameId },

    /// An action referenced a card outside the current hand.
    #[error("card index {index} is out of range for a hand of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A chopsticks action named the same card twice.
    #[error("chopsticks must play two different cards, got {0} twice")]
    DuplicateIndex(usize),
}
