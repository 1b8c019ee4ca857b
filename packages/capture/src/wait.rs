//! Bounded waiting for page readiness
//!
//! Replaces fixed sleeps: a condition is polled until it holds or the
//! timeout elapses.

use std::thread;
use std::time::{Duration, Instant};

use crate::Result;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Upper bound on the total wait
    pub timeout: Duration,

    /// Delay between condition checks
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
        )
    }
}

/// Poll `condition` until it returns `true` or the timeout elapses.
///
/// Returns `Ok(true)` if the condition held, `Ok(false)` on timeout. The
/// condition is always checked at least once. Errors from the condition are
/// returned immediately.
pub fn wait_until<F>(config: &WaitConfig, mut condition: F) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    let deadline = Instant::now() + config.timeout;

    loop {
        if condition()? {
            return Ok(true);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }

        thread::sleep(config.poll_interval.min(deadline - now));
    }
}
