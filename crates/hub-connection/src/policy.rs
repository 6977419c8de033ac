//! Backoff schedules for the two recovery paths.
//!
//! The initial-connect path and the mid-session path are deliberately
//! separate objects: the first is driven by the lifecycle manager's attempt
//! counter, the second by the transport's own retry index.

use std::time::Duration;

/// Bounded exponential backoff applied before the first successful connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialConnectPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl InitialConnectPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns `min(base * 2^attempt, cap)`. `attempt` is zero-based.
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.min(20);
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let cap_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let calculated = base_ms.saturating_mul(1_u64 << shift);
        Duration::from_millis(calculated.min(cap_ms))
    }
}

impl Default for InitialConnectPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(1_000), Duration::from_millis(10_000))
    }
}

/// Fixed schedule walked by the transport after an established connection
/// drops. Running off the end of the schedule means "give up".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidSessionPolicy {
    delays: Vec<Duration>,
}

impl MidSessionPolicy {
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
        }
    }

    /// Delay before retry number `retry_index` (zero-based), or `None` once
    /// the schedule is exhausted.
    pub fn delay_for_retry(&self, retry_index: usize) -> Option<Duration> {
        self.delays.get(retry_index).copied()
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for MidSessionPolicy {
    fn default() -> Self {
        Self::new([0, 2_000, 5_000, 10_000].map(Duration::from_millis))
    }
}

/// Both schedules, as configured for one session. Carried by the
/// connection handle; the lifecycle manager reads `initial`, the reconnect
/// loop reads `mid_session`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial: InitialConnectPolicy,
    pub mid_session: MidSessionPolicy,
}
