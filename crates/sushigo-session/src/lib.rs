//! Client session state for the Sushi Go client.
//!
//! This crate is the client's in-memory model of "where am I in the
//! game": who the server says we are, what's in our hand, which action is
//! still waiting for an answer, and the last public round/game results.
//!
//! 1. **Identity**: game id, player id and rejoin token ([`Session`])
//! 2. **Lifecycle**: the connection/turn state machine ([`Status`])
//! 3. **State**: hand, pending action, round and game projections
//!    ([`SessionState`])
//!
//! Every mutation is a named transition that checks the current
//! [`Status`] first and fails with [`StateError`] if it doesn't apply.
//! Nothing here does I/O.
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)    ← feeds decoded events in, reads snapshots out
//!     ↕
//! Session (this crate)
//!     ↕
//! Protocol (below)  ← provides Hand, Card, Payload, id types
//! ```

mod error;
mod session;
mod state;

pub use error::StateError;
pub use session::{PendingAction, Session, Status};
pub use state::{GameState, RoundState, SessionState};
