//! # Sushi Go client
//!
//! A resilient protocol client for networked Sushi Go games.
//!
//! The client keeps one connection to a game server, tracks the session
//! purely from what the server says, survives disconnects by rejoining
//! with its token, and asks a pluggable [`Strategy`](sushigo_engine::Strategy)
//! for a card at every decision point. Bot authors implement that one
//! trait; this crate does the rest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sushigo::prelude::*;
//!
//! struct LastCard;
//!
//! impl Strategy for LastCard {
//!     fn choose_card(&self, hand: &[&str], _ctx: &DecisionContext<'_>) -> usize {
//!         hand.len() - 1
//!     }
//! }
//!
//! # async fn play() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new()
//!     .game("abc123")
//!     .player_name("bot")
//!     .build(LastCard)?;
//! client.run().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod connection;
mod engine;
mod error;

pub use client::{ClientBuilder, DEFAULT_PORT};
pub use connection::{ConnectionManager, Delivery};
pub use engine::{GameSummary, Outcome, ProtocolEngine};
pub use error::{Failure, SushiGoError};

pub use sushigo_backoff::BackoffConfig;
pub use tokio_util::sync::CancellationToken;

pub mod prelude {
    pub use crate::{
        BackoffConfig, CancellationToken, ClientBuilder, Failure, GameSummary, Outcome,
        SushiGoError,
    };
    pub use sushigo_engine::{DecisionContext, FirstCard, Strategy, from_fn};
}
