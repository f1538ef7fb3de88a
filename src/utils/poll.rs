//! Generic polling with timeout.
//!
//! Replaces fixed "sleep and hope" pauses with an explicit
//! condition/budget/interval triple, so callers state what they are
//! waiting for and for how long.

use std::future::Future;
use std::time::{Duration, Instant};

/// Configuration for polling operations
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub timeout_ms: u64,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub use_exponential_backoff: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10000,
            initial_interval_ms: 100,
            max_interval_ms: 500,
            use_exponential_backoff: true,
        }
    }
}

impl PollConfig {
    /// Fixed-interval polling, no backoff.
    pub fn every(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            initial_interval_ms: interval_ms,
            max_interval_ms: interval_ms,
            use_exponential_backoff: false,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Generic polling function with optional exponential backoff
///
/// Calls `check_fn` repeatedly until it returns `true` or the timeout is
/// reached. Returns `true` if the condition was met, `false` if timed out.
pub async fn wait_until<F, Fut>(check_fn: F, config: &PollConfig) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut interval = config.initial_interval_ms;

    loop {
        if check_fn().await {
            return true;
        }

        if start.elapsed() >= timeout {
            return false;
        }

        tokio::time::sleep(Duration::from_millis(interval)).await;

        if config.use_exponential_backoff {
            interval = (interval * 3 / 2).min(config.max_interval_ms);
        }
    }
}
