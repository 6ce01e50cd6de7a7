//! Codec trait and the text implementation used on the wire.
//!
//! A "codec" converts between typed messages and raw lines. The client is
//! generic over [`Codec`], so a different framing (say, a JSON variant of
//! the protocol) could be swapped in without touching the state machine.

use crate::{
    Card, Command, Event, GameId, Hand, ParseError, Payload, PlayerId,
    RejoinToken,
};

/// Converts outgoing commands to lines and incoming lines to events.
///
/// `Send + Sync + 'static` so a codec can live inside the long-running
/// client task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a command into a single line, without terminator.
    fn encode(&self, command: &Command) -> String;

    /// Parses one line (terminator already stripped) into an event.
    ///
    /// # Errors
    /// Returns a [`ParseError`] if the line is empty or a known message
    /// kind has a malformed body. Unknown keywords are not errors; they
    /// decode to [`Event::Unknown`].
    fn decode(&self, line: &str) -> Result<Event, ParseError>;
}

// ---------------------------------------------------------------------------
// TextCodec
// ---------------------------------------------------------------------------

/// The whitespace-delimited text protocol spoken by the game server.
///
/// ## Example
///
/// ```rust
/// use sushigo_protocol::{Codec, Command, Event, TextCodec};
///
/// let codec = TextCodec;
///
/// let event = codec.decode("HAND 0:Tempura 1:Egg Nigiri").unwrap();
/// match event {
///     Event::Hand(hand) => assert_eq!(hand.names(), ["Tempura", "Egg Nigiri"]),
///     other => panic!("unexpected {other:?}"),
/// }
///
/// assert_eq!(codec.encode(&Command::Play { index: 1 }), "PLAY 1");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn encode(&self, command: &Command) -> String {
        command.to_string()
    }

    fn decode(&self, line: &str) -> Result<Event, ParseError> {
        decode_line(line)
    }
}

fn decode_line(line: &str) -> Result<Event, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (line, ""),
    };

    match keyword {
        "WELCOME" => {
            let mut fields = rest.split_whitespace();
            let game_id = required(&mut fields, "WELCOME", "game id")?;
            let player_id =
                player_id(required(&mut fields, "WELCOME", "player id")?, "WELCOME")?;
            let token = required(&mut fields, "WELCOME", "token")?;
            Ok(Event::Welcome {
                game_id: GameId::new(game_id),
                player_id,
                token: RejoinToken::new(token),
            })
        }
        "REJOINED" => {
            let mut fields = rest.split_whitespace();
            let game_id = required(&mut fields, "REJOINED", "game id")?;
            let player_id = player_id(
                required(&mut fields, "REJOINED", "player id")?,
                "REJOINED",
            )?;
            Ok(Event::Rejoined {
                game_id: GameId::new(game_id),
                player_id,
                token: fields.next().map(RejoinToken::new),
            })
        }
        "OK" => Ok(Event::Ok),
        "HAND" => decode_hand(rest).map(Event::Hand),
        "PLAYED" => Ok(Event::Played(Payload::new(rest))),
        "ROUND_START" => {
            let value = required(&mut rest.split_whitespace(), "ROUND_START", "round")?;
            let round = value.parse().map_err(|_| ParseError::InvalidNumber {
                kind: "ROUND_START",
                field: "round",
                value: value.to_string(),
            })?;
            Ok(Event::RoundStart { round })
        }
        "ROUND_END" => Ok(Event::RoundEnd(Payload::new(rest))),
        "GAME_END" => Ok(Event::GameEnd(Payload::new(rest))),
        "WAITING" => Ok(Event::Waiting(Payload::new(rest))),
        "ERR" | "ERROR" => Ok(Event::Error {
            reason: rest.trim_end().to_string(),
        }),
        _ => Ok(Event::Unknown(line.to_string())),
    }
}

fn required<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    kind: &'static str,
    field: &'static str,
) -> Result<&'a str, ParseError> {
    fields.next().ok_or(ParseError::MissingField { kind, field })
}

fn player_id(value: &str, kind: &'static str) -> Result<PlayerId, ParseError> {
    value
        .parse()
        .map(PlayerId)
        .map_err(|_| ParseError::InvalidNumber {
            kind,
            field: "player id",
            value: value.to_string(),
        })
}

/// Parses `0:Tempura 1:Maki Roll (2) 2:Egg Nigiri`.
///
/// A token starting with `<digits>:` opens a new card; any other token
/// continues the previous card's name, which is how names with spaces
/// survive whitespace tokenization.
fn decode_hand(payload: &str) -> Result<Hand, ParseError> {
    let mut cards: Vec<Card> = Vec::new();
    let mut current: Option<String> = None;

    for token in payload.split_whitespace() {
        match indexed(token)? {
            Some((index, name)) => {
                if let Some(name) = current.take() {
                    cards.push(finish_card(name, cards.len())?);
                }
                let expected = cards.len();
                if index != expected {
                    return Err(ParseError::HandIndexMismatch {
                        expected,
                        found: index,
                    });
                }
                current = Some(name.to_string());
            }
            None => match current.as_mut() {
                Some(name) => {
                    if !name.is_empty() {
                        name.push(' ');
                    }
                    name.push_str(token);
                }
                None => return Err(ParseError::MalformedCard(token.to_string())),
            },
        }
    }

    if let Some(name) = current {
        cards.push(finish_card(name, cards.len())?);
    }

    Ok(Hand::new(cards))
}

/// Splits `<digits>:<rest>`. Returns `Ok(None)` for tokens that are not
/// index-prefixed.
fn indexed(token: &str) -> Result<Option<(usize, &str)>, ParseError> {
    let Some((prefix, name)) = token.split_once(':') else {
        return Ok(None);
    };
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let index = prefix
        .parse()
        .map_err(|_| ParseError::MalformedCard(token.to_string()))?;
    Ok(Some((index, name)))
}

fn finish_card(name: String, index: usize) -> Result<Card, ParseError> {
    if name.is_empty() {
        return Err(ParseError::EmptyCardName { index });
    }
    Ok(Card::new(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> Result<Event, ParseError> {
        TextCodec.decode(line)
    }

    fn hand(line: &str) -> Hand {
        match decode(line) {
            Ok(Event::Hand(hand)) => hand,
            other => panic!("expected HAND, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_welcome() {
        assert_eq!(
            decode("WELCOME g1 2 tok1").unwrap(),
            Event::Welcome {
                game_id: GameId::new("g1"),
                player_id: PlayerId(2),
                token: RejoinToken::new("tok1"),
            }
        );
    }

    #[test]
    fn test_decode_welcome_missing_token() {
        assert_eq!(
            decode("WELCOME g1 2").unwrap_err(),
            ParseError::MissingField {
                kind: "WELCOME",
                field: "token"
            }
        );
    }

    #[test]
    fn test_decode_welcome_non_numeric_player() {
        assert!(matches!(
            decode("WELCOME g1 bob tok").unwrap_err(),
            ParseError::InvalidNumber { field: "player id", .. }
        ));
    }

    #[test]
    fn test_decode_rejoined_with_and_without_token() {
        assert_eq!(
            decode("REJOINED g1 2").unwrap(),
            Event::Rejoined {
                game_id: GameId::new("g1"),
                player_id: PlayerId(2),
                token: None,
            }
        );
        assert_eq!(
            decode("REJOINED g1 2 tok2").unwrap(),
            Event::Rejoined {
                game_id: GameId::new("g1"),
                player_id: PlayerId(2),
                token: Some(RejoinToken::new("tok2")),
            }
        );
    }

    #[test]
    fn test_decode_tolerates_trailing_whitespace() {
        assert_eq!(decode("OK   \t").unwrap(), Event::Ok);
        assert_eq!(
            hand("HAND 0:Tempura 1:Sashimi   ").names(),
            vec!["Tempura", "Sashimi"]
        );
    }

    #[test]
    fn test_decode_hand_with_multi_word_names() {
        let h = hand("HAND 0:Maki Roll (3) 1:Egg Nigiri 2:Pudding");
        assert_eq!(h.names(), vec!["Maki Roll (3)", "Egg Nigiri", "Pudding"]);
    }

    #[test]
    fn test_decode_empty_hand() {
        assert!(hand("HAND").is_empty());
    }

    #[test]
    fn test_hand_index_mismatch_is_fatal() {
        let err = decode("HAND 1:Tempura 0:Sashimi").unwrap_err();
        assert_eq!(
            err,
            ParseError::HandIndexMismatch {
                expected: 0,
                found: 1
            }
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_hand_gap_is_a_mismatch() {
        let err = decode("HAND 0:Tempura 2:Sashimi").unwrap_err();
        assert_eq!(
            err,
            ParseError::HandIndexMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_hand_without_leading_index_is_malformed() {
        let err = decode("HAND Tempura 1:Sashimi").unwrap_err();
        assert_eq!(err, ParseError::MalformedCard("Tempura".into()));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_hand_empty_card_name() {
        assert_eq!(
            decode("HAND 0: 1:Sashimi").unwrap_err(),
            ParseError::EmptyCardName { index: 0 }
        );
    }

    #[test]
    fn test_hand_round_trip_preserves_order_and_names() {
        let lines = [
            "HAND 0:Tempura",
            "HAND 0:Tempura 1:Sashimi",
            "HAND 0:Squid Nigiri 1:Maki Roll (1) 2:Chopsticks 3:Wasabi 4:Dumpling",
        ];
        for line in lines {
            let event = decode(line).unwrap();
            assert_eq!(event.to_string(), line);
        }
    }

    #[test]
    fn test_decode_round_start() {
        assert_eq!(
            decode("ROUND_START 2").unwrap(),
            Event::RoundStart { round: 2 }
        );
        assert!(matches!(
            decode("ROUND_START two").unwrap_err(),
            ParseError::InvalidNumber { .. }
        ));
        assert!(matches!(
            decode("ROUND_START").unwrap_err(),
            ParseError::MissingField { .. }
        ));
    }

    #[test]
    fn test_decode_variable_arity_payloads_verbatim() {
        assert_eq!(
            decode("PLAYED 1:Tempura 2:Maki Roll (2)").unwrap(),
            Event::Played(Payload::new("1:Tempura 2:Maki Roll (2)"))
        );
        assert_eq!(
            decode("ROUND_END").unwrap(),
            Event::RoundEnd(Payload::default())
        );
        assert_eq!(
            decode("GAME_END 1:31 2:24 winner:1").unwrap(),
            Event::GameEnd(Payload::new("1:31 2:24 winner:1"))
        );
        assert_eq!(
            decode("WAITING for 2 players").unwrap(),
            Event::Waiting(Payload::new("for 2 players"))
        );
    }

    #[test]
    fn test_decode_both_error_keywords() {
        assert_eq!(
            decode("ERR game full").unwrap(),
            Event::Error {
                reason: "game full".into()
            }
        );
        assert_eq!(
            decode("ERROR invalid index").unwrap(),
            Event::Error {
                reason: "invalid index".into()
            }
        );
    }

    #[test]
    fn test_unknown_keyword_is_not_an_error() {
        assert_eq!(
            decode("SCOREBOARD 1:3 2:4").unwrap(),
            Event::Unknown("SCOREBOARD 1:3 2:4".into())
        );
        // Keywords are case-sensitive.
        assert_eq!(decode("ok").unwrap(), Event::Unknown("ok".into()));
    }

    #[test]
    fn test_empty_line_is_an_error() {
        assert_eq!(decode("   ").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn test_encode_delegates_to_display() {
        assert_eq!(
            TextCodec.encode(&Command::Chopsticks {
                first: 1,
                second: 2
            }),
            "CHOPSTICKS 1 2"
        );
    }
}
