//! Wire protocol for the Sushi Go client.
//!
//! This crate defines the "language" that the client and the game server
//! speak:
//!
//! - **Types** ([`Command`], [`Event`], [`Hand`], [`Card`], [`Payload`]):
//!   the messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`TextCodec`]): how those messages are
//!   converted to and from text lines.
//! - **Errors** ([`ParseError`]): what can go wrong while decoding.
//!
//! # Wire format
//!
//! One message per line, UTF-8, tokens separated by whitespace. The first
//! token is the message keyword:
//!
//! ```text
//! client → server   JOIN g1 Bot | READY | PLAY 2 | CHOPSTICKS 0 3 | REJOIN tok
//! server → client   WELCOME g1 1 tok | OK | HAND 0:Tempura 1:Egg Nigiri | ...
//! ```
//!
//! The protocol layer doesn't know about sockets or game flow. It only
//! knows how to turn a line into a typed value and back.

mod codec;
mod error;
mod types;

pub use codec::{Codec, TextCodec};
pub use error::ParseError;
pub use types::{
    Card, Command, Event, GameId, Hand, Payload, PlayerId, RejoinToken,
};
