//! Flood-control backoff.

use std::time::Duration;

use rand::Rng;

/// Recovery limits for [`QueryClient`](super::QueryClient).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Flood retries per reconnect cycle before forcing a reconnect.
    pub max_flood_retries: u32,
    /// Reconnects per command before giving up.
    pub max_reconnects: u32,
    /// Cap on a single backoff delay.
    pub max_backoff: Duration,
    /// Upper bound of the random jitter added to each flood backoff.
    pub jitter: Duration,
    /// Wait assumed when a flood status carries no `wait <n>ms` hint.
    pub default_flood_wait: Duration,
    /// Pause before each reconnect.
    pub reconnect_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_flood_retries: 5,
            max_reconnects: 2,
            max_backoff: Duration::from_millis(10_000),
            jitter: Duration::from_millis(250),
            default_flood_wait: Duration::from_millis(1_000),
            reconnect_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Delay before flood retry number `retries` (0-based), jitter included.
    pub fn flood_delay(&self, wait_ms: Option<u64>, retries: u32) -> Duration {
        let wait = wait_ms.unwrap_or(self.default_flood_wait.as_millis() as u64);
        let base = backoff_for(wait, retries, self.max_backoff.as_millis() as u64);
        Duration::from_millis(base + self.sample_jitter())
    }

    fn sample_jitter(&self) -> u64 {
        let bound = self.jitter.as_millis() as u64;
        if bound == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=bound)
        }
    }
}

/// Exponential backoff without jitter: `min(wait_ms * 2^retries, cap_ms)`.
pub fn backoff_for(wait_ms: u64, retries: u32, cap_ms: u64) -> u64 {
    let factor = 1u64.checked_shl(retries).unwrap_or(u64::MAX);
    wait_ms.saturating_mul(factor).min(cap_ms)
}
