//! `ConnectionManager`: the one owner of the socket.
//!
//! Wraps a [`Connector`] and a [`Codec`]. Outbound commands are encoded
//! and written as lines; inbound lines are decoded and handed up as
//! [`Delivery`] values. A lost connection is a delivery too, never an
//! error: deciding whether to reconnect belongs to the engine.

use sushigo_protocol::{Codec, Command, Event, ParseError, TextCodec};
use sushigo_transport::{Connection, ConnectionId, Connector, TransportError};
use tracing::{debug, info, warn};

/// One item from the inbound stream.
#[derive(Debug)]
pub enum Delivery {
    /// A line that decoded into an event.
    Event(Event),
    /// A line that didn't.
    Malformed { line: String, error: ParseError },
    /// The connection is gone. `None` for a clean close by the server.
    Disconnected(Option<TransportError>),
}

pub struct ConnectionManager<T: Connector, C: Codec = TextCodec> {
    connector: T,
    codec: C,
    conn: Option<T::Connection>,
}

impl<T: Connector> ConnectionManager<T> {
    pub fn new(connector: T) -> Self {
        Self::with_codec(connector, TextCodec)
    }
}

impl<T: Connector, C: Codec> ConnectionManager<T, C> {
    pub fn with_codec(connector: T, codec: C) -> Self {
        Self {
            connector,
            codec,
            conn: None,
        }
    }

    pub fn peer(&self) -> &str {
        self.connector.peer()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Opens a fresh connection, closing any previous one first.
    pub async fn connect(&mut self) -> Result<ConnectionId, TransportError> {
        self.release().await;
        let conn = self.connector.connect().await?;
        let conn_id = conn.id();
        info!(%conn_id, peer = %self.connector.peer(), "connected");
        self.conn = Some(conn);
        Ok(conn_id)
    }

    /// Encodes and writes one command.
    ///
    /// # Errors
    /// [`TransportError::ConnectionClosed`] when there is no connection,
    /// or whatever the write failed with. A failed write drops the
    /// connection.
    pub async fn send(&mut self, command: &Command) -> Result<(), TransportError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(TransportError::ConnectionClosed("not connected".into()));
        };
        let line = self.codec.encode(command);
        debug!(conn_id = %conn.id(), ">>> {line}");
        let sent = conn.send_line(&line).await;
        if sent.is_err() {
            self.conn = None;
        }
        sent
    }

    /// Waits for the next inbound item. Blank lines are skipped.
    ///
    /// Cancel-safe at line granularity: dropping the future between
    /// lines loses nothing.
    pub async fn next(&mut self) -> Delivery {
        let Some(conn) = self.conn.as_mut() else {
            return Delivery::Disconnected(None);
        };
        let conn_id = conn.id();
        loop {
            match conn.recv_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    debug!(%conn_id, "<<< {line}");
                    return match self.codec.decode(&line) {
                        Ok(event) => Delivery::Event(event),
                        Err(error) => Delivery::Malformed { line, error },
                    };
                }
                Err(TransportError::LineTooLong { max }) => {
                    // The framing resynchronizes at the next newline.
                    warn!(%conn_id, max, "skipping oversized line");
                }
                Ok(None) => {
                    info!(%conn_id, "server closed the connection");
                    self.conn = None;
                    return Delivery::Disconnected(None);
                }
                Err(e) => {
                    warn!(%conn_id, error = %e, "connection lost");
                    self.conn = None;
                    return Delivery::Disconnected(Some(e));
                }
            }
        }
    }

    /// Closes the current connection, if any.
    pub async fn release(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                debug!(conn_id = %conn.id(), error = %e, "error while closing");
            }
        }
    }
}
