//! Tunables for the scheduler and the sync queue

use std::time::Duration;

/// Configuration for the publish scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often the poll tick fires
    pub poll_interval: Duration,
    /// Fixed delay applied before a retryable failure is attempted again
    pub retry_delay: Duration,
    /// Retry budget for newly created tasks
    pub default_max_retries: u32,
    /// How far ahead the session-expiry probe looks
    pub probe_horizon: Duration,
    /// How often the session-expiry probe sweeps
    pub probe_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            retry_delay: Duration::from_secs(5 * 60),
            default_max_retries: 3,
            probe_horizon: Duration::from_secs(60 * 60),
            probe_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl SchedulerConfig {
    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the fixed retry delay
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Retry delay in unix milliseconds
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub const fn retry_delay_ms(&self) -> i64 {
        self.retry_delay.as_millis() as i64
    }

    /// Probe horizon in unix milliseconds
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub const fn probe_horizon_ms(&self) -> i64 {
        self.probe_horizon.as_millis() as i64
    }
}

/// Configuration for the client sync queue
#[derive(Debug, Clone)]
pub struct SyncQueueConfig {
    /// Maximum queue items attempted per drain cycle
    pub drain_batch_size: usize,
    /// Reconciliation attempts before an item is demoted to the error state
    pub max_retries: u32,
}

impl Default for SyncQueueConfig {
    fn default() -> Self {
        Self {
            drain_batch_size: 10,
            max_retries: 3,
        }
    }
}

impl SyncQueueConfig {
    /// Exponential backoff delay before attempt `retry_count + 1`, in ms
    #[must_use]
    pub const fn backoff_ms(retry_count: u32) -> i64 {
        (1_i64 << retry_count) * 1_000
    }
}
