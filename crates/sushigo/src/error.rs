//! Unified error type for the Sushi Go client.

use std::fmt;

use sushigo_engine::EngineError;
use sushigo_protocol::Event;
use sushigo_session::Status;
use sushigo_transport::TransportError;

/// Top-level error that ends a client run.
///
/// Recoverable problems (malformed lines, strategy faults, a dropped
/// connection with retries left) never get this far; they are logged
/// where they happen.
#[derive(Debug, thiserror::Error)]
pub enum SushiGoError {
    /// A protocol violation or illegal state transition.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The server stayed unreachable for the whole retry budget.
    #[error("gave up reconnecting after {attempts} attempts: {source}")]
    ReconnectExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The client was configured with values it can't send.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A [`SushiGoError`] plus where the session was when it happened.
#[derive(Debug)]
pub struct Failure {
    pub error: SushiGoError,
    /// Session status at the time of failure.
    pub status: Status,
    /// The last event received from the server, if any.
    pub last_event: Option<Event>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status: {}, last event: ", self.error, self.status)?;
        match &self.last_event {
            Some(event) => write!(f, "{event})"),
            None => f.write_str("none)"),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
