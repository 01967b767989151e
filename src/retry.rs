// src/retry.rs
//! Bounded exponential backoff for log requests

use std::time::Duration;

/// Attempts allowed for a single fetch operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Wait before the first retry
pub const DEFAULT_BASE_WAIT: Duration = Duration::from_secs(1);
/// Upper bound on any single wait
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

/// Retry budget and backoff schedule for one fetch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_wait: Duration,
    max_wait: Duration,
}

/// Where a fetch operation stands in its retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// A request is about to be made after `failures` consecutive failures
    Attempting { failures: u32, wait: Duration },
    /// The last request failed; sleep for `wait` before the next attempt
    Backoff { failures: u32, wait: Duration },
    /// The budget is spent and the operation has failed permanently
    Exhausted { failures: u32 },
}

impl RetryState {
    /// Consecutive failures recorded so far
    pub fn failures(&self) -> u32 {
        match *self {
            RetryState::Attempting { failures, .. }
            | RetryState::Backoff { failures, .. }
            | RetryState::Exhausted { failures } => failures,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_attempts,
            base_wait,
            max_wait: max_wait.max(base_wait),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_wait(&self) -> Duration {
        self.base_wait
    }

    /// Initial state, also used to reset after any successful request
    pub fn begin(&self) -> RetryState {
        RetryState::Attempting {
            failures: 0,
            wait: self.base_wait,
        }
    }

    /// Whether another attempt is allowed after `failures` consecutive failures
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }

    /// Wait to use after `current`, doubling up to the configured maximum
    pub fn next_wait(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_wait)
    }

    /// Transition taken when the request made in `state` failed
    pub fn on_failure(&self, state: RetryState) -> RetryState {
        match state {
            RetryState::Attempting { failures, wait } => {
                let failures = failures + 1;
                if self.should_retry(failures) {
                    RetryState::Backoff { failures, wait }
                } else {
                    RetryState::Exhausted { failures }
                }
            }
            other => other,
        }
    }

    /// Transition taken once the backoff sleep has elapsed
    pub fn after_backoff(&self, state: RetryState) -> RetryState {
        match state {
            RetryState::Backoff { failures, wait } => RetryState::Attempting {
                failures,
                wait: self.next_wait(wait),
            },
            other => other,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_WAIT, DEFAULT_MAX_WAIT)
    }
}
