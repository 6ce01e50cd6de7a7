//! Transport abstraction layer for the Sushi Go client.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! how the client reaches a game server. The protocol is a stream of
//! newline-terminated text lines, so a connection deals in whole lines:
//! partial reads are buffered below this API and never surface.
//!
//! # Feature Flags
//!
//! - `tcp` (default): TCP transport framed with `tokio-util`'s `AnyDelimiterCodec`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
#[cfg(feature = "tcp")]
pub use tcp::{
    DEFAULT_CONNECT_TIMEOUT, MAX_LINE_LENGTH, TcpConnector, TcpLineConnection,
};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique label for one connection.
///
/// Every reconnect produces a fresh id, which keeps log lines from
/// different sockets of the same session apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Transports should prefer [`ConnectionId::next`].
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocates the next unused id. Ids start at 1 and only grow.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens outbound connections to a game server.
///
/// A connector is reusable: the client calls [`connect`](Self::connect)
/// again after a connection drops.
pub trait Connector: Send + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Opens a new connection.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the peer cannot be reached within
    /// the connector's timeout.
    async fn connect(&mut self) -> Result<Self::Connection, TransportError>;

    /// Human-readable description of the remote end, for logs.
    fn peer(&self) -> &str;
}

/// A single connection that exchanges newline-delimited lines.
///
/// All methods take `&mut self`: a connection has exactly one owner, so
/// writes are serialized by construction.
pub trait Connection: Send + 'static {
    /// Sends one line. The implementation appends the terminator.
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Receives the next complete line, without its terminator.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    /// [`TransportError::LineTooLong`] reports a skipped line and leaves
    /// the connection usable; any other error means it is gone.
    async fn recv_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Flushes pending writes and closes the connection.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
