//! Background reconnect delay policy.
//!
//! The transport adapter keeps retrying the physical link after it drops
//! (or after a failed dial). The policy only answers "how long until the
//! next attempt, if any?" The retry loop itself lives in the connection
//! manager, which owns the link.

use std::time::Duration;

use rand::Rng;

/// How long to wait before re-dialing after a failed or dropped link.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for the delay after backoff is applied.
    pub max_delay: Duration,
    /// Multiplier applied per consecutive failed attempt. `1.0` keeps the
    /// delay fixed.
    pub multiplier: f64,
    /// Random extra delay (0..=jitter) added to every wait so a server
    /// restart is not met by every client at the same instant.
    pub jitter: Duration,
    /// Stop retrying after this many consecutive attempts. `None` retries
    /// forever.
    pub max_attempts: Option<u32>,
    /// When `false`, the link is never re-dialed automatically.
    pub enabled: bool,
}

impl Default for ReconnectPolicy {
    /// Fixed 5 second delay, retry forever.
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(5),
            multiplier: 1.0,
            jitter: Duration::ZERO,
            max_attempts: None,
            enabled: true,
        }
    }
}

impl ReconnectPolicy {
    /// A policy that never re-dials.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Fixed delay between attempts, retrying forever.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            ..Self::default()
        }
    }

    /// Exponential backoff from `initial` doubling up to `max`.
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            initial_delay: initial,
            max_delay: max,
            multiplier: 2.0,
            ..Self::default()
        }
    }

    /// Adds up to `jitter` of random delay to every wait.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Caps the number of consecutive retries.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Returns the wait before retry number `attempt` (0-based), or `None`
    /// when no further retry should happen.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return None;
            }
        }

        let factor = self.multiplier.max(1.0).powi(attempt.min(32) as i32);
        let millis =
            (self.initial_delay.as_millis() as f64 * factor).round() as u64;
        let base = Duration::from_millis(millis)
            .min(self.max_delay.max(self.initial_delay));

        if self.jitter.is_zero() {
            return Some(base);
        }
        let extra = rand::rng().random_range(0..=self.jitter.as_millis() as u64);
        Some(base + Duration::from_millis(extra))
    }
}
