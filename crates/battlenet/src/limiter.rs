//! Fixed-interval request limiter.
//!
//! Battle.net allows 36 000 requests per hour per client, which works out to
//! one request every 100 ms. The refresh engine awaits
//! [`RequestLimiter::acquire`] before each profile call.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Default spacing between API calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Spaces calls at least `min_interval` apart. A zero interval disables it.
pub struct RequestLimiter {
    min_interval: Duration,
    interval: Option<Interval>,
}

impl RequestLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            interval: None,
        }
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next call is allowed.
    ///
    /// The first call returns immediately. A late caller does not get a
    /// burst of catch-up ticks.
    pub async fn acquire(&mut self) {
        if self.min_interval.is_zero() {
            return;
        }
        let min_interval = self.min_interval;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(min_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}

impl Default for RequestLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
