//! Session types: identity, lifecycle status, and the pending action.

use std::fmt;

use serde::Serialize;
use sushigo_protocol::{Command, GameId, PlayerId, RejoinToken};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The identity the server assigned to this client.
///
/// Created from `WELCOME`. The rejoin token is the only credential that
/// survives a disconnect, so this value is kept across reconnects and only
/// the token may be replaced (by `REJOINED`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub rejoin_token: RejoinToken,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Where the client is in the connection and turn lifecycle.
///
/// ```text
///  Connecting ─→ Joining ─→ Waiting ─→ InHand ─→ AwaitingServer
///                              ↑  ↑                    │
///                              │  └────────────────────┘ (OK / PLAYED / ERR)
///                              │
///                   RoundEnd ←─┴─→ GameEnd (terminal)
///
///  any non-terminal ─→ Disconnected ─→ Rejoining ─→ Waiting
/// ```
///
/// `InHand` only exists between storing a hand and recording the action
/// chosen for it; the engine never waits on the network in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Connecting,
    Joining,
    Waiting,
    InHand,
    AwaitingServer,
    RoundEnd,
    GameEnd,
    Disconnected,
    Rejoining,
}

impl Status {
    /// Returns `true` once the game is over. No transition leaves it.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::GameEnd)
    }

    /// Returns `true` while a handshake (`JOIN` or `REJOIN`) is
    /// unanswered.
    pub fn is_handshaking(self) -> bool {
        matches!(self, Self::Joining | Self::Rejoining)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Joining => "joining",
            Self::Waiting => "waiting",
            Self::InHand => "in hand",
            Self::AwaitingServer => "awaiting server",
            Self::RoundEnd => "round end",
            Self::GameEnd => "game end",
            Self::Disconnected => "disconnected",
            Self::Rejoining => "rejoining",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// PendingAction
// ---------------------------------------------------------------------------

/// The decision sent for the current hand, until the server answers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PendingAction {
    Play { index: usize },
    Chopsticks { first: usize, second: usize },
}

impl PendingAction {
    /// Hand indices this action plays, in play order.
    pub fn indices(&self) -> Vec<usize> {
        match *self {
            Self::Play { index } => vec![index],
            Self::Chopsticks { first, second } => vec![first, second],
        }
    }
}

impl From<PendingAction> for Command {
    fn from(action: PendingAction) -> Self {
        match action {
            PendingAction::Play { index } => Command::Play { index },
            PendingAction::Chopsticks { first, second } => {
                Command::Chopsticks { first, second }
            }
        }
    }
}
