//! The protocol state machine.
//!
//! [`Machine`] turns server events into session transitions and, at each
//! decision point, into exactly one outbound command. It never touches a
//! socket: the caller feeds it deliveries and sends whatever it returns.
//! That keeps every ordering rule testable without a network.
//!
//! # Flow
//!
//! ```text
//! on_connected()        → JOIN or REJOIN
//! on_event(WELCOME)     → READY
//! on_event(HAND)        → PLAY / CHOPSTICKS   (queued if still awaiting)
//! on_event(OK|PLAYED|ERR) resolves the pending action, then replays a
//!                        queued HAND if there is one
//! on_malformed(..)      → skipped, unless it breaks the hand contract
//! on_disconnected()     → forget hand and pending action, keep identity
//! ```

use std::time::Instant;

use sushigo_protocol::{Command, Event, Hand, ParseError};
use sushigo_session::{PendingAction, SessionState, StateError, Status};
use tracing::{debug, info, warn};

use crate::{DecisionContext, EngineConfig, EngineError, ProtocolViolation, Strategy, StrategyError};

/// The client-side protocol engine, minus the I/O.
pub struct Machine<S> {
    config: EngineConfig,
    strategy: S,
    state: SessionState,
    /// A `HAND` that arrived before the previous action was answered.
    queued_hand: Option<Hand>,
    last_event: Option<Event>,
}

impl<S: Strategy> Machine<S> {
    pub fn new(config: EngineConfig, strategy: S) -> Self {
        Self {
            config,
            strategy,
            state: SessionState::new(),
            queued_hand: None,
            last_event: None,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The last event received, for failure diagnostics.
    pub fn last_event(&self) -> Option<&Event> {
        self.last_event.as_ref()
    }

    /// Returns `true` once `GAME_END` has been processed.
    pub fn is_finished(&self) -> bool {
        self.state.status().is_terminal()
    }

    // -- Inputs -----------------------------------------------------------

    /// A connection is up. Returns the handshake to send on it: `REJOIN`
    /// when the server has issued us a token, `JOIN` otherwise.
    pub fn on_connected(&mut self) -> Result<Command, EngineError> {
        if self.state.session().is_some() {
            let token = self.state.begin_rejoin()?;
            info!(game_id = %self.config.game_id, "rejoining game");
            Ok(Command::Rejoin { token })
        } else {
            self.state.begin_join()?;
            info!(
                game_id = %self.config.game_id,
                player_name = %self.config.player_name,
                "joining game"
            );
            Ok(Command::Join {
                game_id: self.config.game_id.clone(),
                name: self.config.player_name.clone(),
            })
        }
    }

    /// The connection is gone. Hand and pending action are dropped; the
    /// identity is kept for the rejoin.
    pub fn on_disconnected(&mut self) -> Result<(), EngineError> {
        let status = self.state.status();
        self.state.disconnect()?;
        if self.queued_hand.take().is_some() {
            debug!("dropped queued hand on disconnect");
        }
        warn!(status = %status, "disconnected from server");
        Ok(())
    }

    /// A line that failed to decode.
    ///
    /// # Errors
    /// [`ProtocolViolation::HandIndexMismatch`] for a `HAND` with
    /// mislabelled cards. Everything else is logged and skipped.
    pub fn on_malformed(
        &mut self,
        line: &str,
        error: ParseError,
    ) -> Result<(), EngineError> {
        if let ParseError::HandIndexMismatch { expected, found } = error {
            return Err(ProtocolViolation::HandIndexMismatch {
                expected,
                found,
                line: line.to_owned(),
            }
            .into());
        }
        warn!(%line, error = %error, "skipping malformed line");
        Ok(())
    }

    /// A decoded event. Returns the command to send in response, if any.
    ///
    /// # Errors
    /// Any [`EngineError`] is fatal: a rejected handshake, a protocol
    /// violation, or an event that doesn't fit the current status.
    pub fn on_event(&mut self, event: Event) -> Result<Option<Command>, EngineError> {
        self.last_event = Some(event.clone());
        let status = self.state.status();

        match event {
            Event::Welcome {
                game_id,
                player_id,
                token,
            } => {
                self.state.apply_welcome(game_id.clone(), player_id, token)?;
                info!(%game_id, %player_id, "joined game");
                Ok(Some(Command::Ready))
            }

            Event::Rejoined {
                game_id,
                player_id,
                token,
            } => {
                match self.state.apply_rejoined(game_id.clone(), player_id, token) {
                    Err(StateError::GameMismatch { expected, got }) => {
                        let violation = ProtocolViolation::RejoinedOtherGame { expected, got };
                        return Err(violation.into());
                    }
                    other => other?,
                }
                info!(%game_id, %player_id, "rejoined game");
                Ok(None)
            }

            Event::Error { reason } => match status {
                Status::Joining => Err(ProtocolViolation::JoinRejected { reason }.into()),
                Status::Rejoining => Err(ProtocolViolation::RejoinRejected { reason }.into()),
                Status::AwaitingServer => {
                    let refused = self.state.apply_rejected()?;
                    warn!(%reason, action = ?refused, "server rejected action");
                    self.drain_queue()
                }
                _ => {
                    warn!(%reason, status = %status, "server error");
                    Ok(None)
                }
            },

            Event::Ok => {
                if status == Status::AwaitingServer {
                    let played = self.state.apply_ack()?;
                    debug!(?played, "action acknowledged");
                    self.drain_queue()
                } else {
                    debug!(status = %status, "ignoring OK with no pending action");
                    Ok(None)
                }
            }

            Event::Hand(hand) => {
                if status == Status::AwaitingServer {
                    if self.queued_hand.replace(hand).is_some() {
                        warn!("second hand arrived before acknowledgement, keeping the newest");
                    } else {
                        debug!("hand queued until the pending action is answered");
                    }
                    Ok(None)
                } else {
                    self.take_hand(hand)
                }
            }

            Event::Played(payload) => {
                self.state.apply_played_result(payload)?;
                debug!(turn = self.state.round().turn, "turn complete");
                self.drain_queue()
            }

            Event::RoundStart { round } => {
                self.state.apply_round_start(round)?;
                info!(round, "round started");
                Ok(None)
            }

            Event::RoundEnd(payload) => {
                self.state.apply_round_end(payload.clone())?;
                if self.queued_hand.take().is_some() {
                    debug!("dropped queued hand at round end");
                }
                info!(
                    round = self.state.round().round,
                    result = %payload,
                    "round ended"
                );
                Ok(None)
            }

            Event::GameEnd(payload) => {
                self.state.apply_game_end(payload.clone())?;
                self.queued_hand = None;
                info!(result = %payload, "game over");
                Ok(None)
            }

            Event::Waiting(payload) => {
                debug!(%payload, "server is waiting");
                Ok(None)
            }

            Event::Unknown(line) => {
                warn!(%line, "ignoring unknown message");
                Ok(None)
            }
        }
    }

    // -- Decision point ---------------------------------------------------

    fn take_hand(&mut self, hand: Hand) -> Result<Option<Command>, EngineError> {
        if hand.is_empty() {
            warn!("ignoring empty hand");
            return Ok(None);
        }
        debug!(%hand, "new hand");
        self.state.apply_hand(hand)?;
        let action = self.choose_action();
        self.state.record_action(action)?;
        Ok(Some(action.into()))
    }

    /// Replays a queued hand once the previous action has been answered.
    fn drain_queue(&mut self) -> Result<Option<Command>, EngineError> {
        if self.state.status() != Status::Waiting {
            return Ok(None);
        }
        match self.queued_hand.take() {
            Some(hand) => self.take_hand(hand),
            None => Ok(None),
        }
    }

    /// Asks the strategy for a decision and repairs invalid answers.
    fn choose_action(&self) -> PendingAction {
        let hand = self.state.hand();
        let names = hand.names();
        let len = names.len();
        let ctx = DecisionContext::from_state(&self.state);
        let started = Instant::now();

        let mut action = None;
        if ctx.has_chopsticks && len >= 2 {
            if let Some((first, second)) = self.strategy.choose_chopsticks(&names, &ctx) {
                match StrategyError::check_pair(first, second, len) {
                    Ok((first, second)) => {
                        action = Some(PendingAction::Chopsticks { first, second });
                    }
                    Err(e) => warn!(error = %e, "strategy fault, playing a single card"),
                }
            }
        }

        let action = action.unwrap_or_else(|| {
            let index = self.strategy.choose_card(&names, &ctx);
            let index = StrategyError::check_card(index, len).unwrap_or_else(|e| {
                warn!(error = %e, "strategy fault, playing card 0");
                0
            });
            PendingAction::Play { index }
        });

        let elapsed = started.elapsed();
        if elapsed > self.config.strategy_budget {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.config.strategy_budget.as_millis() as u64,
                "strategy exceeded its time budget"
            );
        }
        debug!(?action, "decision made");
        action
    }
}
