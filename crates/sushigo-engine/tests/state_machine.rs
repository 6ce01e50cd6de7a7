//! Integration tests for the protocol state machine.
//!
//! Server lines go through the real `TextCodec` so these tests exercise
//! the same decode → dispatch → encode path the client uses, minus the
//! socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sushigo_engine::{
    DecisionContext, EngineConfig, EngineError, FirstCard, Machine, ProtocolViolation,
    Strategy, from_fn,
};
use sushigo_protocol::{Codec, TextCodec};
use sushigo_session::{StateError, Status};

// =========================================================================
// Helpers
// =========================================================================

/// Drives a machine with wire lines and records what it sends.
struct Harness<S> {
    machine: Machine<S>,
    sent: Vec<String>,
}

impl<S: Strategy> Harness<S> {
    fn new(strategy: S) -> Self {
        Self {
            machine: Machine::new(EngineConfig::new("g1", "alice"), strategy),
            sent: Vec::new(),
        }
    }

    fn connect(&mut self) {
        let cmd = self.machine.on_connected().expect("handshake");
        self.sent.push(TextCodec.encode(&cmd));
    }

    fn feed(&mut self, line: &str) -> Result<(), EngineError> {
        match TextCodec.decode(line) {
            Ok(event) => {
                if let Some(cmd) = self.machine.on_event(event)? {
                    self.sent.push(TextCodec.encode(&cmd));
                }
            }
            Err(e) => self.machine.on_malformed(line, e)?,
        }
        Ok(())
    }

    fn feed_all(&mut self, lines: &[&str]) {
        for line in lines {
            self.feed(line).unwrap_or_else(|e| panic!("{line}: {e}"));
        }
    }

    fn status(&self) -> Status {
        self.machine.status()
    }
}

fn joined<S: Strategy>(strategy: S) -> Harness<S> {
    let mut h = Harness::new(strategy);
    h.connect();
    h.feed_all(&["WELCOME g1 1 tok1", "OK"]);
    h
}

fn pick(index: usize) -> impl Strategy {
    from_fn(move |_: &[&str], _: &DecisionContext<'_>| index)
}

/// Always tries chopsticks on the last two cards; counts how often it's asked.
struct Greedy {
    asked: Arc<AtomicUsize>,
    pair: (usize, usize),
}

impl Strategy for Greedy {
    fn choose_card(&self, _hand: &[&str], _ctx: &DecisionContext<'_>) -> usize {
        0
    }

    fn choose_chopsticks(
        &self,
        _hand: &[&str],
        _ctx: &DecisionContext<'_>,
    ) -> Option<(usize, usize)> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Some(self.pair)
    }
}

// =========================================================================
// Join and the first decision
// =========================================================================

#[test]
fn test_welcome_then_hand_sends_ready_then_play() {
    let mut h = Harness::new(pick(1));
    h.connect();
    h.feed_all(&["WELCOME g1 1 tok1", "HAND 0:Tempura 1:Sashimi"]);

    assert_eq!(h.sent, ["JOIN g1 alice", "READY", "PLAY 1"]);
    assert_eq!(h.status(), Status::AwaitingServer);
}

#[test]
fn test_ok_for_ready_changes_nothing() {
    let h = joined(FirstCard);
    assert_eq!(h.sent, ["JOIN g1 alice", "READY"]);
    assert_eq!(h.status(), Status::Waiting);
}

#[test]
fn test_join_rejected_is_fatal() {
    let mut h = Harness::new(FirstCard);
    h.connect();
    let err = h.feed("ERR game is full").unwrap_err();
    assert_eq!(
        err,
        EngineError::Violation(ProtocolViolation::JoinRejected {
            reason: "game is full".into()
        })
    );
}

#[test]
fn test_event_before_welcome_is_a_state_error() {
    let mut h = Harness::new(FirstCard);
    h.connect();
    let err = h.feed("PLAYED 1:Tempura").unwrap_err();
    assert!(matches!(
        err,
        EngineError::State(StateError::IllegalTransition {
            status: Status::Joining,
            ..
        })
    ));
}

// =========================================================================
// Decision invariants
// =========================================================================

#[test]
fn test_never_sends_out_of_range_play() {
    for len in 1..=8usize {
        for choice in 0..12usize {
            let mut h = joined(pick(choice));
            let cards: Vec<String> = (0..len).map(|i| format!("{i}:Dumpling")).collect();
            h.feed(&format!("HAND {}", cards.join(" "))).unwrap();

            let last = h.sent.last().unwrap();
            let index: usize = last.strip_prefix("PLAY ").unwrap().parse().unwrap();
            assert!(index < len, "len {len}, choice {choice}, sent {last}");
        }
    }
}

#[test]
fn test_hand_while_awaiting_is_queued_until_ok() {
    let mut h = joined(FirstCard);
    h.feed_all(&["HAND 0:Tempura 1:Sashimi", "HAND 0:Pudding"]);
    assert_eq!(h.sent.len(), 3, "second hand must not trigger a command yet");
    assert_eq!(h.status(), Status::AwaitingServer);

    h.feed("OK").unwrap();
    assert_eq!(h.sent.last().unwrap(), "PLAY 0");
    assert_eq!(h.sent.len(), 4);
    assert_eq!(h.machine.state().hand().names(), ["Pudding"]);
    assert_eq!(h.status(), Status::AwaitingServer);
}

#[test]
fn test_at_most_one_action_outstanding() {
    let mut h = joined(FirstCard);
    let script = [
        "HAND 0:Tempura 1:Sashimi 2:Dumpling",
        "HAND 0:Wasabi 1:Pudding",
        "HAND 0:Maki Roll (2)",
        "OK",
        "PLAYED 1:Tempura 2:Wasabi",
        "OK",
        "PLAYED 1:Maki Roll (2)",
    ];
    let mut outstanding = 0;
    for line in script {
        let before = h.sent.len();
        h.feed(line).unwrap();
        if line == "OK" || line.starts_with("PLAYED") {
            outstanding = 0;
        }
        outstanding += h.sent.len() - before;
        assert!(outstanding <= 1, "after {line}: {:?}", h.sent);
    }
}

#[test]
fn test_ok_consumes_the_played_card() {
    let mut h = joined(pick(1));
    h.feed_all(&["HAND 0:Tempura 1:Sashimi 2:Egg Nigiri", "OK"]);
    let state = h.machine.state();
    assert_eq!(state.hand().names(), ["Tempura", "Egg Nigiri"]);
    assert_eq!(state.round().played.len(), 1);
    assert_eq!(state.round().played[0].name(), "Sashimi");
    assert_eq!(h.status(), Status::Waiting);
}

#[test]
fn test_server_error_resolves_without_consuming() {
    let mut h = joined(FirstCard);
    h.feed_all(&["HAND 0:Tempura 1:Sashimi", "ERR not your turn"]);
    assert_eq!(h.status(), Status::Waiting);
    assert_eq!(h.machine.state().hand().len(), 2);
    assert!(h.machine.state().pending().is_none());

    h.feed("HAND 0:Sashimi").unwrap();
    assert_eq!(h.sent.last().unwrap(), "PLAY 0");
}

#[test]
fn test_slow_strategy_still_plays() {
    let slow = from_fn(|_: &[&str], _: &DecisionContext<'_>| {
        std::thread::sleep(Duration::from_millis(20));
        0
    });
    let mut h = Harness {
        machine: Machine::new(
            EngineConfig::new("g1", "alice").with_strategy_budget(Duration::from_millis(1)),
            slow,
        ),
        sent: Vec::new(),
    };
    h.connect();
    h.feed_all(&["WELCOME g1 1 tok1", "HAND 0:Tempura"]);
    assert_eq!(h.sent.last().unwrap(), "PLAY 0");
}

// =========================================================================
// Chopsticks
// =========================================================================

#[test]
fn test_chopsticks_hook_used_once_chopsticks_are_on_the_table() {
    let asked = Arc::new(AtomicUsize::new(0));
    let mut h = joined(Greedy {
        asked: Arc::clone(&asked),
        pair: (1, 0),
    });

    h.feed_all(&["HAND 0:Chopsticks 1:Tempura", "OK", "PLAYED 1:Chopsticks"]);
    assert_eq!(asked.load(Ordering::SeqCst), 0, "no chopsticks on the table yet");
    assert!(h.machine.state().round().has_chopsticks());

    h.feed_all(&["HAND 0:Squid Nigiri 1:Wasabi 2:Pudding"]);
    assert_eq!(h.sent.last().unwrap(), "CHOPSTICKS 1 0");
    assert_eq!(asked.load(Ordering::SeqCst), 1);

    h.feed("OK").unwrap();
    let state = h.machine.state();
    assert_eq!(state.hand().names(), ["Pudding"]);
    assert!(!state.round().has_chopsticks(), "chopsticks go back to the hand");
}

#[test]
fn test_chopsticks_hook_skipped_for_single_card() {
    let asked = Arc::new(AtomicUsize::new(0));
    let mut h = joined(Greedy {
        asked: Arc::clone(&asked),
        pair: (1, 0),
    });
    h.feed_all(&["HAND 0:Chopsticks 1:Tempura", "OK", "PLAYED 1:Chopsticks", "HAND 0:Tempura"]);
    assert_eq!(asked.load(Ordering::SeqCst), 0);
    assert_eq!(h.sent.last().unwrap(), "PLAY 0");
}

#[test]
fn test_invalid_chopsticks_pair_falls_back_to_play() {
    let mut h = joined(Greedy {
        asked: Arc::new(AtomicUsize::new(0)),
        pair: (1, 1),
    });
    h.feed_all(&["HAND 0:Chopsticks 1:Tempura", "OK", "PLAYED 1:Chopsticks"]);
    h.feed("HAND 0:Tempura 1:Sashimi").unwrap();
    assert_eq!(h.sent.last().unwrap(), "PLAY 0");
}

// =========================================================================
// Malformed input
// =========================================================================

#[test]
fn test_hand_index_mismatch_is_fatal_and_silent() {
    let mut h = joined(FirstCard);
    let before = h.sent.clone();

    let err = h.feed("HAND 1:Tempura 0:Sashimi").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Violation(ProtocolViolation::HandIndexMismatch { expected: 0, found: 1, .. })
    ));
    assert_eq!(h.sent, before);
}

#[test]
fn test_malformed_line_is_skipped() {
    let mut h = joined(FirstCard);
    h.feed("ROUND_START soon").unwrap();
    h.feed("FROBNICATE 1 2").unwrap();
    assert_eq!(h.status(), Status::Waiting);
    assert_eq!(h.machine.state().round().round, 1);
}

// =========================================================================
// Rounds and game end
// =========================================================================

#[test]
fn test_round_cycle_and_game_end() {
    let mut h = joined(FirstCard);
    h.feed_all(&[
        "ROUND_START 1",
        "HAND 0:Tempura",
        "OK",
        "PLAYED 1:Tempura",
        "ROUND_END 1:5",
    ]);
    assert_eq!(h.status(), Status::RoundEnd);
    assert_eq!(h.machine.state().game().rounds_completed, 1);

    h.feed_all(&["ROUND_START 2", "HAND 0:Pudding"]);
    assert_eq!(h.machine.state().round().round, 2);
    assert_eq!(h.sent.last().unwrap(), "PLAY 0");

    h.feed_all(&["OK", "PLAYED 1:Pudding", "ROUND_END 1:9", "GAME_END 1:9 winner:1"]);
    assert!(h.machine.is_finished());
    let game = h.machine.state().game();
    assert_eq!(game.rounds_completed, 2);
    assert_eq!(
        game.final_result.as_ref().map(|p| p.as_str()),
        Some("1:9 winner:1")
    );
}

#[test]
fn test_game_end_while_waiting_is_terminal() {
    let mut h = joined(FirstCard);
    h.feed("GAME_END 1:12").unwrap();
    assert_eq!(h.status(), Status::GameEnd);
    assert!(h.machine.is_finished());
}

// =========================================================================
// Disconnect and rejoin
// =========================================================================

#[test]
fn test_reconnect_sends_rejoin_with_latest_token() {
    let mut h = joined(FirstCard);
    h.feed("HAND 0:Tempura 1:Sashimi").unwrap();
    h.machine.on_disconnected().unwrap();
    assert!(h.machine.state().hand().is_empty());

    h.connect();
    assert_eq!(h.sent.last().unwrap(), "REJOIN tok1");
    h.feed("REJOINED g1 1 tok2").unwrap();
    assert_eq!(h.status(), Status::Waiting);

    h.machine.on_disconnected().unwrap();
    h.connect();
    assert_eq!(h.sent.last().unwrap(), "REJOIN tok2");
    assert_eq!(h.sent.iter().filter(|s| s.starts_with("JOIN")).count(), 1);
}

#[test]
fn test_disconnect_before_welcome_joins_again() {
    let mut h = Harness::new(FirstCard);
    h.connect();
    h.machine.on_disconnected().unwrap();
    h.connect();
    assert_eq!(h.sent, ["JOIN g1 alice", "JOIN g1 alice"]);
}

#[test]
fn test_rejoin_rejected_is_fatal() {
    let mut h = joined(FirstCard);
    h.machine.on_disconnected().unwrap();
    h.connect();
    let err = h.feed("ERROR unknown token").unwrap_err();
    assert_eq!(
        err,
        EngineError::Violation(ProtocolViolation::RejoinRejected {
            reason: "unknown token".into()
        })
    );
}

#[test]
fn test_rejoined_into_other_game_is_fatal() {
    let mut h = joined(FirstCard);
    h.machine.on_disconnected().unwrap();
    h.connect();
    let err = h.feed("REJOINED g2 1").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Violation(ProtocolViolation::RejoinedOtherGame { .. })
    ));
}
