//! Integration tests for the reconnect backoff.
//!
//! Jitter is disabled where exact delays are asserted. Async tests run
//! with a paused clock so sleeps resolve as soon as time is advanced.

use std::time::Duration;

use sushigo_backoff::{Backoff, BackoffConfig};

// =========================================================================
// Helpers
// =========================================================================

fn exact(max_attempts: u32) -> BackoffConfig {
    BackoffConfig {
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(500),
        multiplier: 2.0,
        max_attempts,
        jitter: 0.0,
    }
}

// =========================================================================
// BackoffConfig
// =========================================================================

#[test]
fn test_default_config() {
    let cfg = BackoffConfig::default();
    assert_eq!(cfg.initial_delay, Duration::from_millis(250));
    assert_eq!(cfg.max_delay, Duration::from_secs(8));
    assert_eq!(cfg.multiplier, 2.0);
    assert_eq!(cfg.max_attempts, 5);
    assert_eq!(cfg.jitter, 0.1);
}

#[test]
fn test_with_max_attempts_keeps_other_defaults() {
    let cfg = BackoffConfig::with_max_attempts(9);
    assert_eq!(cfg.max_attempts, 9);
    assert_eq!(cfg.initial_delay, Duration::from_millis(250));
}

#[test]
fn test_nominal_delay_is_capped() {
    let cfg = exact(10);
    assert_eq!(cfg.nominal_delay(0), Duration::from_millis(100));
    assert_eq!(cfg.nominal_delay(2), Duration::from_millis(400));
    assert_eq!(cfg.nominal_delay(3), Duration::from_millis(500));
    assert_eq!(cfg.nominal_delay(u32::MAX), Duration::from_millis(500));
}

// =========================================================================
// Budget
// =========================================================================

#[test]
fn test_delays_grow_then_run_out() {
    let mut b = Backoff::new(exact(4));
    let delays: Vec<_> = std::iter::from_fn(|| b.next_delay()).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(500),
        ]
    );
    assert!(b.is_exhausted());
    assert_eq!(b.attempts(), 4);
    assert_eq!(b.next_delay(), None);
}

#[test]
fn test_zero_attempts_never_retries() {
    let mut b = Backoff::new(exact(0));
    assert!(b.is_exhausted());
    assert_eq!(b.next_delay(), None);
}

#[test]
fn test_reset_restores_budget_and_schedule() {
    let mut b = Backoff::new(exact(2));
    b.next_delay();
    b.next_delay();
    assert!(b.is_exhausted());

    b.reset();
    assert_eq!(b.attempts(), 0);
    assert_eq!(b.next_delay(), Some(Duration::from_millis(100)));
}

// =========================================================================
// Async wait
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_sleeps_for_the_delay() {
    let mut b = Backoff::new(exact(3));
    let start = tokio::time::Instant::now();

    assert!(b.wait().await);
    assert_eq!(start.elapsed(), Duration::from_millis(100));

    assert!(b.wait().await);
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_false_when_exhausted() {
    let mut b = Backoff::new(exact(1));
    assert!(b.wait().await);
    let before = tokio::time::Instant::now();
    assert!(!b.wait().await);
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_wait_can_be_raced_against_cancellation() {
    tokio::time::pause();
    let mut b = Backoff::new(BackoffConfig {
        initial_delay: Duration::from_secs(60),
        max_delay: Duration::from_secs(60),
        ..exact(1)
    });
    let timeout = tokio::time::sleep(Duration::from_millis(10));

    let finished = tokio::select! {
        done = b.wait() => done,
        _ = timeout => false,
    };
    assert!(!finished);
    assert_eq!(b.attempts(), 1, "the attempt was spent before sleeping");
}
