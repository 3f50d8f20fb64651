//! Per-resource staleness and retry policy.

use std::time::Duration;

/// How long an entry stays fresh and how often a failed read is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    pub stale_time: Duration,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_delay`.
    pub retry_delay: Duration,
}

impl QueryPolicy {
    pub const fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    pub const fn with_retries(self, retries: u32, retry_delay: Duration) -> Self {
        Self {
            stale_time: self.stale_time,
            retries,
            retry_delay,
        }
    }

    /// Primary list resources (tasks, habits): 30 s fresh, no retry.
    pub const fn list() -> Self {
        Self::new(Duration::from_secs(30))
    }

    /// Single-entity reads.
    pub const fn detail() -> Self {
        Self::new(Duration::from_secs(30))
    }

    /// Analytics aggregations: 5 min fresh, retried twice.
    pub const fn analytics() -> Self {
        Self::new(Duration::from_secs(5 * 60)).with_retries(2, Duration::from_secs(1))
    }

    /// Chat history.
    pub const fn chat() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
