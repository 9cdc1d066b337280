//! Bounded retries for calls that cross the I/O boundary.
//!
//! Only embedding generation and vector store calls go through here; the
//! distance and clustering code never retries. Callers say which errors are
//! worth another attempt; anything else fails on the spot.

use std::thread;
use std::time::Duration;

use tracing::warn;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Retry policy with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Sleep before the second attempt; doubled after each failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Runs `op` until it succeeds, fails with an error `is_transient`
    /// rejects, or the attempts are exhausted. Returns the last error.
    pub fn run<T, E, F, P>(&self, what: &str, is_transient: P, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;

        for attempt in 1..attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !is_transient(&e) => return Err(e),
                Err(e) => {
                    warn!(%e, attempt, max_attempts = attempts, "{what} failed, retrying");
                    if !backoff.is_zero() {
                        thread::sleep(backoff);
                    }
                    backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
                }
            }
        }

        op()
    }
}
