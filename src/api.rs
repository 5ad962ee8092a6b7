//! Retry with exponential backoff for search-API calls.
//!
//! Only transient failures are retried (see [`crate::error::CountError::is_transient`]):
//! network errors, HTTP 429, and 5xx. Anything else is returned on the first
//! attempt.
//!
//! # Backoff Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::error::Result;
use rand::{Rng, rng};
use std::future::Future;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// Retry policy applied to each search request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Additional attempts after the first failure. `0` disables retrying.
    pub max_retries: usize,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: StdDuration,
    /// Cap on the exponential part of the delay.
    pub max_delay: StdDuration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: StdDuration,
}

impl Backoff {
    pub fn new(max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(60),
            max_jitter: StdDuration::from_millis(250),
        }
    }

    /// Fail on the first error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: StdDuration::ZERO,
            max_delay: StdDuration::ZERO,
            max_jitter: StdDuration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn delay_for(&self, attempt: usize) -> StdDuration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    fn jitter(&self) -> StdDuration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return StdDuration::ZERO;
        }
        StdDuration::from_millis(rng().random_range(0..=max_ms))
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run out.
    pub async fn retry<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                what,
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                                error = %e,
                                "Exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt) + self.jitter();
                    warn!(
                        what,
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "Transient failure; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(3, StdDuration::from_secs(2))
    }
}
