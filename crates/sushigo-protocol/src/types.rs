//! Core protocol types for the Sushi Go wire format.
//!
//! Every type here either travels on the wire or is built directly from
//! something that did. `Display` on [`Command`] and [`Event`] produces the
//! exact wire line (without the trailing newline).

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The server-assigned identifier of a game.
///
/// Newtype wrapper so a game id can't be passed where a player name or a
/// token is expected, even though all three are strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    /// Creates a game id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The server-assigned seat number of this client within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque credential that lets a disconnected client resume its seat.
///
/// Issued in `WELCOME` (and optionally refreshed in `REJOINED`). The
/// client never inspects it, only echoes it back in `REJOIN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RejoinToken(pub String);

impl RejoinToken {
    /// Creates a token from anything string-like.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RejoinToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Cards and hands
// ---------------------------------------------------------------------------

/// A single card as named by the server (`Tempura`, `Maki Roll (2)`, ...).
///
/// Cards have no identity beyond their name and their position in a
/// [`Hand`]; two `Tempura` cards are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card {
    name: String,
}

impl Card {
    /// Creates a card with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the card's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The cards currently held, in the order the server listed them.
///
/// Indices are 0-based and match the indices the server expects in
/// `PLAY`/`CHOPSTICKS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    /// Creates a hand from an ordered list of cards.
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Number of cards in the hand.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns `true` if the hand holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Returns the card at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// The cards as a slice.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Borrowed card names, in hand order. This is the view handed to
    /// strategies.
    pub fn names(&self) -> Vec<&str> {
        self.cards.iter().map(Card::name).collect()
    }

    /// Removes and returns the card at `index`, shifting later cards left.
    pub fn remove(&mut self, index: usize) -> Option<Card> {
        if index < self.cards.len() {
            Some(self.cards.remove(index))
        } else {
            None
        }
    }

    /// Iterates over the cards in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Renders the `HAND` payload form: `0:Tempura 1:Egg Nigiri`.
impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{i}:{card}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payload: opaque variable-arity data
// ---------------------------------------------------------------------------

/// The body of a `PLAYED`, `ROUND_END`, `GAME_END` or `WAITING` line.
///
/// The server's format for these is not pinned down, so the text is kept
/// verbatim (minus surrounding whitespace) for display, and only a loose
/// `key:value` view is offered on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    raw: String,
}

impl Payload {
    /// Wraps the text after the message keyword.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw: String = raw.into();
        Self {
            raw: raw.trim().to_string(),
        }
    }

    /// The payload exactly as received.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the message carried no payload.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Whitespace-separated tokens.
    pub fn tokens(&self) -> std::str::SplitWhitespace<'_> {
        self.raw.split_whitespace()
    }

    /// Tokens split at their first `:`; tokens without one have no value.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.tokens().map(|token| match token.split_once(':') {
            Some((key, value)) => (key, Some(value)),
            None => (token, None),
        })
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// Command: client → server
// ---------------------------------------------------------------------------

/// A message the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// "Seat me in this game under this name."
    Join { game_id: GameId, name: String },

    /// "I'm ready to start." Sent once, right after `WELCOME`.
    Ready,

    /// "I play the card at this index."
    Play { index: usize },

    /// "I use my chopsticks to play these two cards."
    Chopsticks { first: usize, second: usize },

    /// "I was disconnected; here is my token."
    Rejoin { token: RejoinToken },
}

impl Command {
    /// The wire keyword for this command.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Join { .. } => "JOIN",
            Self::Ready => "READY",
            Self::Play { .. } => "PLAY",
            Self::Chopsticks { .. } => "CHOPSTICKS",
            Self::Rejoin { .. } => "REJOIN",
        }
    }

    /// Returns `true` for commands that answer a decision point.
    ///
    /// At most one of these may be unacknowledged at any time.
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Play { .. } | Self::Chopsticks { .. })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join { game_id, name } => write!(f, "JOIN {game_id} {name}"),
            Self::Ready => f.write_str("READY"),
            Self::Play { index } => write!(f, "PLAY {index}"),
            Self::Chopsticks { first, second } => {
                write!(f, "CHOPSTICKS {first} {second}")
            }
            Self::Rejoin { token } => write!(f, "REJOIN {token}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Event: server → client
// ---------------------------------------------------------------------------

/// A message received from the server.
///
/// This is the typed event union the client's state machine matches on;
/// nothing past the decoder looks at raw keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The join succeeded. Carries the identity to keep for the session.
    Welcome {
        game_id: GameId,
        player_id: PlayerId,
        token: RejoinToken,
    },

    /// The previous command was accepted.
    Ok,

    /// A `REJOIN` succeeded. The server may rotate the token.
    Rejoined {
        game_id: GameId,
        player_id: PlayerId,
        token: Option<RejoinToken>,
    },

    /// A new hand: a decision point.
    Hand(Hand),

    /// Everyone's cards for the turn were revealed.
    Played(Payload),

    /// A new round begins.
    RoundStart { round: u32 },

    /// The round is over; payload carries scores.
    RoundEnd(Payload),

    /// The game is over; payload carries final results.
    GameEnd(Payload),

    /// The server is waiting on other players.
    Waiting(Payload),

    /// The server reported an error (`ERR ...` or `ERROR ...`).
    Error { reason: String },

    /// A line with a keyword this client doesn't know. Kept verbatim.
    Unknown(String),
}

impl Event {
    /// Short name of the event kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "WELCOME",
            Self::Ok => "OK",
            Self::Rejoined { .. } => "REJOINED",
            Self::Hand(_) => "HAND",
            Self::Played(_) => "PLAYED",
            Self::RoundStart { .. } => "ROUND_START",
            Self::RoundEnd(_) => "ROUND_END",
            Self::GameEnd(_) => "GAME_END",
            Self::Waiting(_) => "WAITING",
            Self::Error { .. } => "ERR",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Renders the event the way a server would send it.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn keyword_and(
            f: &mut fmt::Formatter<'_>,
            keyword: &str,
            payload: &dyn fmt::Display,
        ) -> fmt::Result {
            let body = payload.to_string();
            if body.is_empty() {
                f.write_str(keyword)
            } else {
                write!(f, "{keyword} {body}")
            }
        }

        match self {
            Self::Welcome {
                game_id,
                player_id,
                token,
            } => write!(f, "WELCOME {game_id} {player_id} {token}"),
            Self::Ok => f.write_str("OK"),
            Self::Rejoined {
                game_id,
                player_id,
                token: Some(token),
            } => write!(f, "REJOINED {game_id} {player_id} {token}"),
            Self::Rejoined {
                game_id,
                player_id,
                token: None,
            } => write!(f, "REJOINED {game_id} {player_id}"),
            Self::Hand(hand) => keyword_and(f, "HAND", hand),
            Self::Played(p) => keyword_and(f, "PLAYED", p),
            Self::RoundStart { round } => write!(f, "ROUND_START {round}"),
            Self::RoundEnd(p) => keyword_and(f, "ROUND_END", p),
            Self::GameEnd(p) => keyword_and(f, "GAME_END", p),
            Self::Waiting(p) => keyword_and(f, "WAITING", p),
            Self::Error { reason } => keyword_and(f, "ERR", reason),
            Self::Unknown(line) => f.write_str(line),
        }
    }
}
