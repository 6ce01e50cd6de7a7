//! Error types for the engine layer.

use sushigo_protocol::GameId;
use sushigo_session::StateError;

/// A fatal engine failure. The session can't continue after one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Violation(#[from] ProtocolViolation),

    #[error("session state: {0}")]
    State(#[from] StateError),
}

/// The server sent something that breaks the protocol contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// A `HAND` card index didn't match its position.
    #[error("hand index mismatch: expected {expected}, found {found} in {line:?}")]
    HandIndexMismatch {
        expected: usize,
        found: usize,
        line: String,
    },

    /// The server refused our `JOIN`.
    #[error("join rejected: {reason}")]
    JoinRejected { reason: String },

    /// The server refused our `REJOIN`.
    #[error("rejoin rejected: {reason}")]
    RejoinRejected { reason: String },

    /// `REJOINED` put us in a game other than the one we left.
    #[error("rejoined game {got}, expected {expected}")]
    RejoinedOtherGame { expected: GameId, got: GameId },
}

/// A strategy answer the engine refused. Logged and recovered from
/// locally; never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error("strategy chose card {index} from a hand of {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("strategy chose chopsticks pair ({first}, {second}) from a hand of {len}")]
    InvalidChopsticks {
        first: usize,
        second: usize,
        len: usize,
    },
}

impl StrategyError {
    pub(crate) fn check_card(index: usize, len: usize) -> Result<usize, Self> {
        if index < len {
            Ok(index)
        } else {
            Err(Self::OutOfRange { index, len })
        }
    }

    pub(crate) fn check_pair(
        first: usize,
        second: usize,
        len: usize,
    ) -> Result<(usize, usize), Self> {
        if first < len && second < len && first != second {
            Ok((first, second))
        } else {
            Err(Self::InvalidChopsticks { first, second, len })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_checks() {
        assert_eq!(StrategyError::check_pair(0, 1, 2), Ok((0, 1)));
        assert!(StrategyError::check_pair(1, 1, 2).is_err());
        assert!(StrategyError::check_pair(0, 2, 2).is_err());
        assert_eq!(
            StrategyError::check_card(3, 3),
            Err(StrategyError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_violation_display() {
        let err = EngineError::from(ProtocolViolation::JoinRejected {
            reason: "game full".into(),
        });
        assert_eq!(err.to_string(), "join rejected: game full");
    }
}
