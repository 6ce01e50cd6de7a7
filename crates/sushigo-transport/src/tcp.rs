//! TCP transport implementation framed on `\n`.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder, Framed};

use crate::{Connection, ConnectionId, Connector, TransportError};

/// Longest line accepted from the server, in bytes.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Connect timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`Connector`] that dials a fixed `host:port` over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    connect_timeout: Duration,
}

impl TcpConnector {
    /// Creates a connector for the given host and port.
    ///
    /// Bare IPv6 literals are bracketed so the address stays parseable.
    pub fn new(host: &str, port: u16) -> Self {
        let addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        Self {
            addr,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the upper bound for a single connect attempt.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the `host:port` string this connector dials.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Connector for TcpConnector {
    type Connection = TcpLineConnection;

    async fn connect(&mut self) -> Result<Self::Connection, TransportError> {
        let attempt = tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect(self.addr.as_str()),
        )
        .await;

        let stream = match attempt {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(TransportError::ConnectFailed {
                    addr: self.addr.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    addr: self.addr.clone(),
                    timeout: self.connect_timeout,
                });
            }
        };

        // One small line per decision: don't let Nagle hold it back.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "could not set TCP_NODELAY");
        }

        let id = ConnectionId::next();
        tracing::debug!(%id, addr = %self.addr, "TCP connection established");

        Ok(TcpLineConnection {
            id,
            framed: Framed::new(stream, ServerLines::new(MAX_LINE_LENGTH)),
        })
    }

    fn peer(&self) -> &str {
        &self.addr
    }
}

/// A single TCP connection carrying newline-terminated lines.
///
/// Partial reads are buffered until a `\n` arrives and a trailing `\r`
/// is stripped, so callers only ever see whole lines.
pub struct TcpLineConnection {
    id: ConnectionId,
    framed: Framed<TcpStream, ServerLines>,
}

impl Connection for TcpLineConnection {
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.framed.send(line).await.map_err(send_error)
    }

    async fn recv_line(&mut self) -> Result<Option<String>, TransportError> {
        match self.framed.next().await {
            Some(Ok(Frame::Line(line))) => Ok(Some(line)),
            Some(Ok(Frame::TooLong)) => Err(TransportError::LineTooLong {
                max: MAX_LINE_LENGTH,
            }),
            Some(Err(AnyDelimiterCodecError::Io(e))) => Err(TransportError::ReceiveFailed(e)),
            Some(Err(AnyDelimiterCodecError::MaxChunkLengthExceeded)) => {
                Err(TransportError::LineTooLong {
                    max: MAX_LINE_LENGTH,
                })
            }
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        tracing::debug!(id = %self.id, "closing TCP connection");
        SinkExt::<&str>::close(&mut self.framed)
            .await
            .map_err(send_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

fn send_error(e: AnyDelimiterCodecError) -> TransportError {
    match e {
        AnyDelimiterCodecError::Io(e) => TransportError::SendFailed(e),
        AnyDelimiterCodecError::MaxChunkLengthExceeded => TransportError::LineTooLong {
            max: MAX_LINE_LENGTH,
        },
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    /// A line over the length limit. Its bytes are dropped up to the next
    /// newline.
    TooLong,
}

/// Line framing that never ends the stream on bad input.
///
/// `Framed` yields nothing more once its decoder has returned an error,
/// so an oversized line comes back as [`Frame::TooLong`] and invalid
/// UTF-8 is decoded lossily. Only I/O errors are errors.
#[derive(Debug)]
struct ServerLines {
    inner: AnyDelimiterCodec,
}

impl ServerLines {
    fn new(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\n".to_vec(),
                max_length,
            ),
        }
    }

    fn frame(
        decoded: Result<Option<Bytes>, AnyDelimiterCodecError>,
    ) -> Result<Option<Frame>, AnyDelimiterCodecError> {
        match decoded {
            Ok(Some(chunk)) => Ok(Some(Frame::Line(to_line(&chunk)))),
            Ok(None) => Ok(None),
            // The inner codec now discards through the next delimiter.
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(Frame::TooLong)),
            Err(e) => Err(e),
        }
    }
}

fn to_line(chunk: &[u8]) -> String {
    let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
    String::from_utf8_lossy(chunk).into_owned()
}

impl Decoder for ServerLines {
    type Item = Frame;
    type Error = AnyDelimiterCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        Self::frame(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        Self::frame(self.inner.decode_eof(buf))
    }
}

impl Encoder<&str> for ServerLines {
    type Error = AnyDelimiterCodecError;

    fn encode(&mut self, line: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.inner.encode(line, dst)
    }
}
