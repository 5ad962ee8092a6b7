//! Request pacing for the rate-limited search endpoint.
//!
//! The article search API asks for at least six seconds between calls (and
//! 4,000 calls a day). Callers go through a [`RateLimiter`] before every
//! request; swapping the implementation changes the pacing policy without
//! touching the call sites.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Interval the search API asks clients to keep between requests.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(6150);

/// Gate that callers pass through before each rate-limited request.
pub trait RateLimiter {
    /// Wait until the next request is allowed.
    async fn acquire(&self);
}

/// Fixed-interval gate: the first request goes straight through, and every
/// later one waits until `interval` has passed since the previous one.
#[derive(Debug)]
pub struct FixedInterval {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }
}

impl RateLimiter for FixedInterval {
    async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.interval;
            if ready_at > Instant::now() {
                debug!(wait_ms = (ready_at - Instant::now()).as_millis() as u64, "Pacing request");
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
