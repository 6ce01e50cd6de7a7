//! Error types for the protocol layer.
//!
//! Decoding problems are split in two kinds. Most are recoverable: the
//! offending line is logged and skipped. A `HAND` whose card indices don't
//! match their positions is not, because acting on it would send an index
//! the server interprets differently. [`ParseError::is_fatal`] tells the
//! two apart.

/// Errors that can occur while decoding a server line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line was empty or whitespace only.
    #[error("empty line")]
    Empty,

    /// A fixed-arity message was missing one of its fields.
    #[error("{kind}: missing {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// A numeric field did not parse.
    #[error("{kind}: invalid {field} `{value}`")]
    InvalidNumber {
        kind: &'static str,
        field: &'static str,
        value: String,
    },

    /// A `HAND` payload token was not of the form `<index>:<card>`.
    #[error("HAND: malformed card token `{0}`")]
    MalformedCard(String),

    /// A `HAND` card had nothing after its `<index>:` prefix.
    #[error("HAND: card {index} has an empty name")]
    EmptyCardName { index: usize },

    /// A `HAND` card's index did not match its position in the hand.
    #[error("HAND: card at position {expected} is labelled {found}")]
    HandIndexMismatch { expected: usize, found: usize },
}

impl ParseError {
    /// Returns `true` if the error breaks the protocol contract and the
    /// session must not continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HandIndexMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_index_mismatch_is_fatal() {
        assert!(
            ParseError::HandIndexMismatch {
                expected: 0,
                found: 1
            }
            .is_fatal()
        );
        assert!(!ParseError::Empty.is_fatal());
        assert!(!ParseError::MalformedCard("x".into()).is_fatal());
        assert!(
            !ParseError::MissingField {
                kind: "WELCOME",
                field: "token"
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_display_names_the_message_kind() {
        let err = ParseError::InvalidNumber {
            kind: "ROUND_START",
            field: "round",
            value: "two".into(),
        };
        assert_eq!(err.to_string(), "ROUND_START: invalid round `two`");
    }
}
