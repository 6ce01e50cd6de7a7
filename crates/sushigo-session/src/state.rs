//! The session state holder: every fact the client knows about its game.
//!
//! `SessionState` is owned by exactly one state machine. Callers read it
//! through shared references and change it only through the `apply_*` /
//! `begin_*` transitions below, each of which checks the current
//! [`Status`] before touching anything.
//!
//! # Transition table
//!
//! ```text
//! begin_join            Connecting | Disconnected(no identity) → Joining
//! apply_welcome         Joining                                → Waiting
//! begin_rejoin          Disconnected(identity)                 → Rejoining
//! apply_rejoined        Rejoining                              → Waiting
//! apply_hand            Waiting | RoundEnd                     → InHand
//! record_action         InHand                                 → AwaitingServer
//! apply_ack             AwaitingServer                         → Waiting
//! apply_rejected        AwaitingServer                         → Waiting
//! apply_played_result   Waiting | AwaitingServer               → Waiting
//! apply_round_start     Waiting | RoundEnd                     → Waiting
//! apply_round_end       Waiting | AwaitingServer               → RoundEnd
//! apply_game_end        Waiting | AwaitingServer | RoundEnd    → GameEnd
//! disconnect            any non-terminal                       → Disconnected
//! ```

use serde::Serialize;
use sushigo_protocol::{Card, GameId, Hand, Payload, PlayerId, RejoinToken};

use crate::{PendingAction, Session, StateError, Status};

const WASABI: &str = "Wasabi";
const CHOPSTICKS: &str = "Chopsticks";

// ---------------------------------------------------------------------------
// RoundState / GameState
// ---------------------------------------------------------------------------

/// What this client knows about the round in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundState {
    /// Round number, from the last `ROUND_START` (1 before any).
    pub round: u32,
    /// Turn within the round; advanced by each `PLAYED`.
    pub turn: u32,
    /// Cards this client has put on the table this round, in order.
    pub played: Vec<Card>,
    /// The most recent `PLAYED` payload, verbatim.
    pub last_played: Option<Payload>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            round: 1,
            turn: 1,
            played: Vec::new(),
            last_played: None,
        }
    }
}

impl RoundState {
    /// A Chopsticks card is on the table and can be used this turn.
    pub fn has_chopsticks(&self) -> bool {
        self.played.iter().any(|c| c.name() == CHOPSTICKS)
    }

    /// A Wasabi on the table has no nigiri on it yet.
    pub fn has_unused_wasabi(&self) -> bool {
        let mut open = 0u32;
        for card in &self.played {
            match card.name() {
                WASABI => open += 1,
                name if name.ends_with("Nigiri") && open > 0 => open -= 1,
                _ => {}
            }
        }
        open > 0
    }

    fn reset(&mut self, round: u32) {
        self.round = round;
        self.turn = 1;
        self.played.clear();
        self.last_played = None;
    }
}

/// Results reported by the server across the whole game.
///
/// Always the last server message of each kind, never computed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameState {
    /// Number of `ROUND_END` messages seen.
    pub rounds_completed: u32,
    /// The most recent `ROUND_END` payload.
    pub last_round_end: Option<Payload>,
    /// The `GAME_END` payload, once the game is over.
    pub final_result: Option<Payload>,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The authoritative client-side model of one game session.
#[derive(Debug, Clone)]
pub struct SessionState {
    status: Status,
    session: Option<Session>,
    hand: Hand,
    pending: Option<PendingAction>,
    round: RoundState,
    game: GameState,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// A fresh state in [`Status::Connecting`] with no identity.
    pub fn new() -> Self {
        Self {
            status: Status::Connecting,
            session: None,
            hand: Hand::default(),
            pending: None,
            round: RoundState::default(),
            game: GameState::default(),
        }
    }

    // -- Read-only views --------------------------------------------------

    pub fn status(&self) -> Status {
        self.status
    }

    /// The server-assigned identity, once `WELCOME` has been received.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    /// The action sent for the current hand, if still unanswered.
    pub fn pending(&self) -> Option<PendingAction> {
        self.pending
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    // -- Connection lifecycle ---------------------------------------------

    /// A `JOIN` is about to be sent on a fresh connection.
    ///
    /// # Errors
    /// [`StateError::IllegalTransition`] unless connecting for the first
    /// time, or reconnecting before any identity was issued.
    pub fn begin_join(&mut self) -> Result<(), StateError> {
        let fresh = self.status == Status::Connecting
            || (self.status == Status::Disconnected && self.session.is_none());
        if !fresh {
            return Err(self.illegal("begin_join"));
        }
        self.set_status(Status::Joining);
        Ok(())
    }

    /// `WELCOME` arrived: store the identity for the rest of the session.
    pub fn apply_welcome(
        &mut self,
        game_id: GameId,
        player_id: PlayerId,
        rejoin_token: RejoinToken,
    ) -> Result<(), StateError> {
        self.require("apply_welcome", &[Status::Joining])?;
        self.session = Some(Session {
            game_id,
            player_id,
            rejoin_token,
        });
        self.set_status(Status::Waiting);
        Ok(())
    }

    /// A `REJOIN` is about to be sent. Returns the token to send.
    ///
    /// # Errors
    /// [`StateError::NoIdentity`] if no `WELCOME` was ever received.
    pub fn begin_rejoin(&mut self) -> Result<RejoinToken, StateError> {
        self.require("begin_rejoin", &[Status::Disconnected])?;
        let token = self
            .session
            .as_ref()
            .map(|s| s.rejoin_token.clone())
            .ok_or(StateError::NoIdentity)?;
        self.set_status(Status::Rejoining);
        Ok(token)
    }

    /// `REJOINED` arrived. The hand is not resent, so the client resumes
    /// empty-handed until the next `HAND`.
    ///
    /// # Errors
    /// [`StateError::GameMismatch`] if the server put us in another game.
    pub fn apply_rejoined(
        &mut self,
        game_id: GameId,
        player_id: PlayerId,
        rejoin_token: Option<RejoinToken>,
    ) -> Result<(), StateError> {
        self.require("apply_rejoined", &[Status::Rejoining])?;
        let session = self.session.as_mut().ok_or(StateError::NoIdentity)?;
        if session.game_id != game_id {
            return Err(StateError::GameMismatch {
                expected: session.game_id.clone(),
                got: game_id,
            });
        }
        if session.player_id != player_id {
            tracing::warn!(
                old = %session.player_id,
                new = %player_id,
                "server reassigned player id on rejoin"
            );
            session.player_id = player_id;
        }
        if let Some(token) = rejoin_token {
            session.rejoin_token = token;
        }
        self.set_status(Status::Waiting);
        Ok(())
    }

    /// The connection dropped. The hand and any pending action are
    /// forgotten: the server won't resend the hand, and there is no way
    /// to learn whether the pending action landed.
    pub fn disconnect(&mut self) -> Result<(), StateError> {
        if self.status.is_terminal() {
            return Err(self.illegal("disconnect"));
        }
        self.hand = Hand::default();
        self.pending = None;
        self.set_status(Status::Disconnected);
        Ok(())
    }

    // -- Turn cycle -------------------------------------------------------

    /// A `HAND` arrived: replace the hand wholesale.
    pub fn apply_hand(&mut self, hand: Hand) -> Result<(), StateError> {
        self.require("apply_hand", &[Status::Waiting, Status::RoundEnd])?;
        self.hand = hand;
        self.set_status(Status::InHand);
        Ok(())
    }

    /// The action chosen for the current hand is being sent.
    ///
    /// # Errors
    /// Fails if not [`Status::InHand`] or if the action doesn't fit the
    /// hand. That makes a second action for one hand impossible.
    pub fn record_action(
        &mut self,
        action: PendingAction,
    ) -> Result<(), StateError> {
        self.require("record_action", &[Status::InHand])?;
        let len = self.hand.len();
        for index in action.indices() {
            if index >= len {
                return Err(StateError::IndexOutOfRange { index, len });
            }
        }
        if let PendingAction::Chopsticks { first, second } = action {
            if first == second {
                return Err(StateError::DuplicateIndex(first));
            }
        }
        self.pending = Some(action);
        self.set_status(Status::AwaitingServer);
        Ok(())
    }

    /// `OK` for the pending action: the played cards leave the hand.
    ///
    /// Returns the cards that were played.
    pub fn apply_ack(&mut self) -> Result<Vec<Card>, StateError> {
        self.require("apply_ack", &[Status::AwaitingServer])?;
        let played = self.settle_pending();
        self.set_status(Status::Waiting);
        Ok(played)
    }

    /// The server refused the pending action. The hand is left as is.
    ///
    /// Returns the action that was refused.
    pub fn apply_rejected(
        &mut self,
    ) -> Result<Option<PendingAction>, StateError> {
        self.require("apply_rejected", &[Status::AwaitingServer])?;
        let refused = self.pending.take();
        self.set_status(Status::Waiting);
        Ok(refused)
    }

    /// `PLAYED` arrived: the turn is over. A still-pending action is
    /// settled as accepted, since its result is now public.
    pub fn apply_played_result(
        &mut self,
        payload: Payload,
    ) -> Result<(), StateError> {
        self.require(
            "apply_played_result",
            &[Status::Waiting, Status::AwaitingServer],
        )?;
        self.settle_pending();
        self.round.turn += 1;
        self.round.last_played = Some(payload);
        self.set_status(Status::Waiting);
        Ok(())
    }

    /// `ROUND_START` arrived.
    pub fn apply_round_start(&mut self, round: u32) -> Result<(), StateError> {
        self.require("apply_round_start", &[Status::Waiting, Status::RoundEnd])?;
        self.round.reset(round);
        self.set_status(Status::Waiting);
        Ok(())
    }

    /// `ROUND_END` arrived: record results, clear the hand and the table.
    pub fn apply_round_end(&mut self, payload: Payload) -> Result<(), StateError> {
        self.require(
            "apply_round_end",
            &[Status::Waiting, Status::AwaitingServer],
        )?;
        self.settle_pending();
        self.hand = Hand::default();
        self.round.played.clear();
        self.game.rounds_completed += 1;
        self.game.last_round_end = Some(payload);
        self.set_status(Status::RoundEnd);
        Ok(())
    }

    /// `GAME_END` arrived: record the final result. Terminal.
    pub fn apply_game_end(&mut self, payload: Payload) -> Result<(), StateError> {
        self.require(
            "apply_game_end",
            &[Status::Waiting, Status::AwaitingServer, Status::RoundEnd],
        )?;
        self.settle_pending();
        self.hand = Hand::default();
        self.game.final_result = Some(payload);
        self.set_status(Status::GameEnd);
        Ok(())
    }

    // -- Internals --------------------------------------------------------

    /// Moves the pending action's cards from the hand to the table.
    fn settle_pending(&mut self) -> Vec<Card> {
        let Some(action) = self.pending.take() else {
            return Vec::new();
        };

        let indices = action.indices();
        let played: Vec<Card> = indices
            .iter()
            .filter_map(|&i| self.hand.get(i).cloned())
            .collect();

        // Highest index first so earlier removals don't shift later ones.
        let mut descending = indices;
        descending.sort_unstable_by(|a, b| b.cmp(a));
        for index in descending {
            self.hand.remove(index);
        }

        if matches!(action, PendingAction::Chopsticks { .. }) {
            // Used chopsticks go back into the hand being passed on.
            if let Some(pos) =
                self.round.played.iter().position(|c| c.name() == CHOPSTICKS)
            {
                self.round.played.remove(pos);
            }
        }
        self.round.played.extend(played.iter().cloned());
        played
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[Status],
    ) -> Result<(), StateError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(self.illegal(operation))
        }
    }

    fn illegal(&self, operation: &'static str) -> StateError {
        StateError::IllegalTransition {
            operation,
            status: self.status,
        }
    }

    fn set_status(&mut self, next: Status) {
        if self.status != next {
            tracing::trace!(from = %self.status, to = %next, "status change");
        }
        self.status = next;
    }
}

// =========================================================================
// Tests
// =========================================================================
