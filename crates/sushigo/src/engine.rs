//! `ProtocolEngine`: the client's run loop.
//!
//! Ties the layers together: connection → codec → state machine →
//! strategy → codec → connection. The loop only ever suspends on three
//! things, each raced against the shutdown token:
//!
//!   1. the next inbound line,
//!   2. a backoff sleep before reconnecting,
//!   3. a connect attempt.
//!
//! Every connect failure and every lost connection spends one attempt
//! of the backoff budget. The budget is restored once a handshake
//! completes, so it bounds consecutive failures, not failures per game.

use serde::Serialize;
use sushigo_backoff::Backoff;
use sushigo_engine::{Machine, Strategy};
use sushigo_protocol::{Codec, Event, GameId, Payload, PlayerId, TextCodec};
use sushigo_session::Status;
use sushigo_transport::{Connector, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::connection::{ConnectionManager, Delivery};
use crate::{Failure, SushiGoError};

/// How a run ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server sent `GAME_END`.
    GameEnded(GameSummary),
    /// The shutdown token fired first.
    Cancelled,
}

/// What the client learned about a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub player_id: Option<PlayerId>,
    pub rounds_completed: u32,
    /// The `GAME_END` payload, verbatim.
    pub final_result: Option<Payload>,
    /// Successful reconnects during the game.
    pub reconnects: u32,
}

impl std::fmt::Display for GameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "game {} over after {} round(s)",
            self.game_id, self.rounds_completed
        )?;
        if let Some(result) = &self.final_result {
            write!(f, ": {result}")?;
        }
        Ok(())
    }
}

pub struct ProtocolEngine<T: Connector, S: Strategy, C: Codec = TextCodec> {
    connection: ConnectionManager<T, C>,
    machine: Machine<S>,
    backoff: Backoff,
    shutdown: CancellationToken,
    /// Why the last connection ended, for the exhausted-retries error.
    last_error: Option<TransportError>,
    reconnects: u32,
}

impl<T, S, C> ProtocolEngine<T, S, C>
where
    T: Connector,
    S: Strategy,
    C: Codec,
{
    pub fn new(
        connection: ConnectionManager<T, C>,
        machine: Machine<S>,
        backoff: Backoff,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connection,
            machine,
            backoff,
            shutdown,
            last_error: None,
            reconnects: 0,
        }
    }

    /// A handle that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn machine(&self) -> &Machine<S> {
        &self.machine
    }

    /// Plays one game to the end.
    ///
    /// Returns when the server ends the game, the shutdown token fires,
    /// or a fatal error occurs. The connection is closed in every case.
    ///
    /// # Errors
    /// A [`Failure`] carrying the error, the session status, and the last
    /// event received.
    pub async fn run(mut self) -> Result<Outcome, Failure> {
        info!(peer = %self.connection.peer(), "client starting");
        let result = self.drive().await;
        self.connection.release().await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                let failure = Failure {
                    error,
                    status: self.machine.status(),
                    last_event: self.machine.last_event().cloned(),
                };
                error!(%failure, "client stopped");
                Err(failure)
            }
        }
    }

    async fn drive(&mut self) -> Result<Outcome, SushiGoError> {
        loop {
            if !self.connection.is_connected() && !self.establish().await? {
                info!("shutdown requested");
                return Ok(Outcome::Cancelled);
            }

            let delivery = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested");
                    return Ok(Outcome::Cancelled);
                }
                delivery = self.connection.next() => delivery,
            };

            match delivery {
                Delivery::Event(event) => {
                    let rejoined = matches!(event, Event::Rejoined { .. });
                    let reply = self.machine.on_event(event)?;
                    if rejoined {
                        self.reconnects += 1;
                    }
                    if !self.machine.status().is_handshaking() {
                        self.backoff.reset();
                    }
                    if let Some(command) = reply {
                        if let Err(e) = self.connection.send(&command).await {
                            warn!(error = %e, %command, "send failed");
                            self.lost(Some(e))?;
                            continue;
                        }
                    }
                    if self.machine.is_finished() {
                        return Ok(Outcome::GameEnded(self.summary()));
                    }
                }
                Delivery::Malformed { line, error } => {
                    self.machine.on_malformed(&line, error)?;
                }
                Delivery::Disconnected(cause) => self.lost(cause)?,
            }
        }
    }

    /// Connects (after a backoff delay, if this is a retry) and sends the
    /// handshake. Returns `false` if shutdown was requested meanwhile.
    async fn establish(&mut self) -> Result<bool, SushiGoError> {
        loop {
            let retrying = self.machine.status() == Status::Disconnected;
            if retrying {
                let budget_left = tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => return Ok(false),
                    waited = self.backoff.wait() => waited,
                };
                if !budget_left {
                    return Err(self.exhausted());
                }
            }

            let connected = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Ok(false),
                connected = self.connection.connect() => connected,
            };

            match connected {
                Ok(_) => {
                    let handshake = self.machine.on_connected()?;
                    match self.connection.send(&handshake).await {
                        Ok(()) => return Ok(true),
                        Err(e) => self.lost(Some(e))?,
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt = self.backoff.attempts(),
                        max_attempts = self.backoff.config().max_attempts,
                        "connect failed"
                    );
                    if self.machine.status() != Status::Disconnected {
                        self.machine.on_disconnected()?;
                    }
                    self.last_error = Some(e);
                }
            }
        }
    }

    /// The connection is gone: move the machine to `Disconnected`.
    fn lost(&mut self, cause: Option<TransportError>) -> Result<(), SushiGoError> {
        self.machine.on_disconnected()?;
        self.last_error = Some(cause.unwrap_or_else(|| {
            TransportError::ConnectionClosed("closed by server".into())
        }));
        Ok(())
    }

    fn exhausted(&mut self) -> SushiGoError {
        let source = self.last_error.take().unwrap_or_else(|| {
            TransportError::ConnectionClosed("no connection attempt succeeded".into())
        });
        SushiGoError::ReconnectExhausted {
            attempts: self.backoff.attempts(),
            source,
        }
    }

    fn summary(&self) -> GameSummary {
        let state = self.machine.state();
        GameSummary {
            game_id: self.machine.config().game_id.clone(),
            player_id: state.session().map(|s| s.player_id),
            rounds_completed: state.game().rounds_completed,
            final_result: state.game().final_result.clone(),
            reconnects: self.reconnects,
        }
    }
}
