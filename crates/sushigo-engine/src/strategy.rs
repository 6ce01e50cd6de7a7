//! The `Strategy` trait: the extension point for bot authors.
//!
//! The engine owns every protocol concern. A strategy only answers one
//! question, "which card from this hand?", and optionally a second one,
//! "do you want to use chopsticks on two cards?". It gets a read-only
//! view of the session and returns indices; it can't touch the
//! connection or the state.

use sushigo_protocol::{Card, Payload, PlayerId};
use sushigo_session::SessionState;

// ---------------------------------------------------------------------------
// DecisionContext
// ---------------------------------------------------------------------------

/// Everything the client knows at a decision point, borrowed from the
/// session.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Our player id, if the server has told us.
    pub player_id: Option<PlayerId>,
    pub round: u32,
    pub turn: u32,
    /// Cards we've put on the table this round, oldest first.
    pub played: &'a [Card],
    /// A Chopsticks card is on our side of the table.
    pub has_chopsticks: bool,
    /// A Wasabi on our side has no nigiri on it yet.
    pub has_unused_wasabi: bool,
    /// The last `PLAYED` payload of this round.
    pub last_played: Option<&'a Payload>,
    /// The last `ROUND_END` payload of the game.
    pub last_round_end: Option<&'a Payload>,
}

impl<'a> DecisionContext<'a> {
    pub fn from_state(state: &'a SessionState) -> Self {
        let round = state.round();
        Self {
            player_id: state.session().map(|s| s.player_id),
            round: round.round,
            turn: round.turn,
            played: &round.played,
            has_chopsticks: round.has_chopsticks(),
            has_unused_wasabi: round.has_unused_wasabi(),
            last_played: round.last_played.as_ref(),
            last_round_end: state.game().last_round_end.as_ref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// The card-selection contract.
///
/// Both hooks receive the hand as ordered card names (never empty) and
/// must be deterministic for identical inputs. The engine validates
/// whatever they return, so a bad index never reaches the server.
///
/// Calls are synchronous and run on the client's only task. The engine
/// times each decision and logs a warning when it runs over
/// `EngineConfig::strategy_budget`, but it can't interrupt one.
pub trait Strategy: Send + 'static {
    /// Picks the index of the card to play.
    ///
    /// An out-of-range index is logged and replaced with 0.
    fn choose_card(&self, hand: &[&str], ctx: &DecisionContext<'_>) -> usize;

    /// Optionally picks two cards to play at once with chopsticks.
    ///
    /// Only asked when a Chopsticks card is on our table and the hand
    /// holds at least two cards. Returning `None` (the default) falls
    /// through to [`choose_card`](Self::choose_card), and so does a pair
    /// that is out of range or names the same card twice.
    fn choose_chopsticks(
        &self,
        _hand: &[&str],
        _ctx: &DecisionContext<'_>,
    ) -> Option<(usize, usize)> {
        None
    }
}

/// Always plays the first card.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCard;

impl Strategy for FirstCard {
    fn choose_card(&self, _hand: &[&str], _ctx: &DecisionContext<'_>) -> usize {
        0
    }
}

/// A [`Strategy`] backed by a closure. Built with [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnStrategy<F>(F);

impl<F> std::fmt::Debug for FnStrategy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnStrategy")
    }
}

/// Wraps a closure as a single-card [`Strategy`].
///
/// ```
/// use sushigo_engine::{from_fn, DecisionContext, Strategy};
///
/// let last = from_fn(|hand: &[&str], _ctx: &DecisionContext<'_>| hand.len() - 1);
/// # let _: &dyn Strategy = &last;
/// ```
pub fn from_fn<F>(f: F) -> FnStrategy<F>
where
    F: Fn(&[&str], &DecisionContext<'_>) -> usize + Send + 'static,
{
    FnStrategy(f)
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(&[&str], &DecisionContext<'_>) -> usize + Send + 'static,
{
    fn choose_card(&self, hand: &[&str], ctx: &DecisionContext<'_>) -> usize {
        (self.0)(hand, ctx)
    }
}
