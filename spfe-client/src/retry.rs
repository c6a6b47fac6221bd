//! Delay schedule between transport retries.
//!
//! The service client has always retried immediately, so the default
//! [`Backoff`] never sleeps. Exponential delays are opt-in.

use std::time::Duration;

/// Attempts made per request unless the caller overrides it.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Delay schedule applied between attempts of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::immediate()
    }
}

impl Backoff {
    /// Retry without waiting.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Exponential backoff starting at `initial_delay`, doubling up to `max_delay`.
    #[must_use]
    pub const fn exponential(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            multiplier: 2.0,
        }
    }

    /// Set the multiplier for exponential backoff.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Whether this schedule ever sleeps.
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        self.initial_delay.is_zero()
    }

    /// Calculate the delay before retry number `retry` (0-based).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if self.is_immediate() {
            return Duration::ZERO;
        }
        let base_delay =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(retry as i32);
        let delay_ms = base_delay.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(delay_ms as u64)
    }
}
