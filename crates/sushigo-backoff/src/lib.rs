//! Exponential backoff for reconnect attempts.
//!
//! Each call to [`Backoff::next_delay`] spends one attempt from the budget
//! and returns how long to wait before it. Delays grow geometrically from
//! `initial_delay` by `multiplier`, are capped at `max_delay`, and are
//! spread by a random `jitter` fraction so several clients that lost the
//! same server don't reconnect in lockstep.
//!
//! # Integration
//!
//! The backoff sits inside the client's reconnect loop, raced against a
//! cancellation token:
//!
//! ```ignore
//! loop {
//!     match connector.connect().await {
//!         Ok(conn) => { backoff.reset(); break conn; }
//!         Err(e) => {
//!             let Some(delay) = backoff.next_delay() else { return Err(e) };
//!             tokio::select! {
//!                 _ = shutdown.cancelled() => return Ok(Cancelled),
//!                 _ = tokio::time::sleep(delay) => {}
//!             }
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Reconnect policy.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay (before jitter).
    pub max_delay: Duration,
    /// Growth factor between consecutive delays. Must be ≥ 1.0.
    pub multiplier: f64,
    /// Retries allowed before giving up. 0 disables reconnecting.
    pub max_attempts: u32,
    /// Random spread as a fraction of the delay (0.0–1.0). 0.1 means each
    /// delay lands somewhere in ±10% of its nominal value.
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            max_attempts: 5,
            jitter: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Same defaults with a different retry budget.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Backoff::new`]. Rules:
    /// - `multiplier` below 1.0 (or NaN) becomes 1.0.
    /// - `jitter` clamped to `0.0..=1.0` (NaN becomes 0.0).
    /// - `max_delay` raised to `initial_delay` if smaller.
    pub fn validated(mut self) -> Self {
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            warn!(
                multiplier = self.multiplier,
                "backoff multiplier below 1.0, using 1.0"
            );
            self.multiplier = 1.0;
        }
        self.jitter = if self.jitter.is_nan() {
            0.0
        } else {
            self.jitter.clamp(0.0, 1.0)
        };
        if self.max_delay < self.initial_delay {
            warn!(
                initial_ms = self.initial_delay.as_millis() as u64,
                max_ms = self.max_delay.as_millis() as u64,
                "backoff max_delay below initial_delay, raising it"
            );
            self.max_delay = self.initial_delay;
        }
        self
    }

    /// Nominal (un-jittered) delay before retry number `attempt` (0-based).
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exp);
        let max = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// A retry budget and delay schedule for one run of the client.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config: config.validated(),
            attempts: 0,
        }
    }

    /// Spend one attempt and return the delay to wait before it, or `None`
    /// when the budget is used up.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let nominal = self.config.nominal_delay(self.attempts);
        self.attempts += 1;
        let delay = apply_jitter(nominal, self.config.jitter);
        debug!(
            attempt = self.attempts,
            max_attempts = self.config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "backoff scheduled"
        );
        Some(delay)
    }

    /// Spend one attempt and sleep for its delay.
    ///
    /// Returns `false` without sleeping when the budget is used up.
    pub async fn wait(&mut self) -> bool {
        match self.next_delay() {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                true
            }
            None => false,
        }
    }

    /// Restore the full budget. Called once a connection is usable again.
    pub fn reset(&mut self) {
        if self.attempts > 0 {
            debug!(attempts = self.attempts, "backoff reset");
        }
        self.attempts = 0;
    }

    /// Attempts spent since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.config.max_attempts
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 || delay.is_zero() {
        return delay;
    }
    let factor = rand::rng().random_range(1.0 - jitter..=1.0 + jitter);
    delay.mul_f64(factor)
}
