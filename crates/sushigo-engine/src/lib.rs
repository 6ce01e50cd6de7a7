//! Protocol state machine for the Sushi Go client.
//!
//! The engine decides what the client says and when. It consumes decoded
//! server events, drives the [`SessionState`](sushigo_session::SessionState)
//! transitions, calls the bot's [`Strategy`] at each decision point, and
//! returns the commands to send. It does no I/O of its own; the
//! `sushigo` crate wires it to a connection.
//!
//! # Key types
//!
//! - [`Machine`]: the state machine itself
//! - [`Strategy`]: the trait bot authors implement
//! - [`DecisionContext`]: the read-only view a strategy gets
//! - [`EngineConfig`]: game id, player name, strategy time budget
//! - [`EngineError`]: fatal failures ([`ProtocolViolation`] or a state error)

mod config;
mod error;
mod machine;
mod strategy;

pub use config::{DEFAULT_STRATEGY_BUDGET, EngineConfig};
pub use error::{EngineError, ProtocolViolation, StrategyError};
pub use machine::Machine;
pub use strategy::{DecisionContext, FirstCard, FnStrategy, Strategy, from_fn};
