//! Bounded retry policy for outbound API calls.
//!
//! Failures are split into three classes, each with its own budget:
//!
//! - **auth**: a 401 triggers exactly one token re-acquisition and one retry.
//! - **transport**: connection, timeout and body errors are retried up to
//!   [`RetryPolicy::transport_retries`] times with exponential backoff.
//! - **rate limit**: a 429 is retried up to [`RetryPolicy::rate_limit_retries`]
//!   times, honouring `Retry-After` when the server sends it.
//!
//! Anything else (403, 404, 5xx, malformed bodies) is not retried here; the
//! caller decides what the status means.

use std::time::Duration;

/// Which failure class an attempt fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Auth,
    Transport,
    RateLimit,
}

/// Tunable retry budgets and backoff parameters.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Re-authentications allowed per call after a 401.
    pub auth_retries: u32,
    /// Extra attempts after a transport-level error.
    pub transport_retries: u32,
    /// Extra attempts after a 429.
    pub rate_limit_retries: u32,
    /// Delay before the first backoff retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            auth_retries: 1,
            transport_retries: 2,
            rate_limit_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// No retries at all, e.g. for one-shot diagnostics.
    pub fn none() -> Self {
        Self {
            auth_retries: 0,
            transport_retries: 0,
            rate_limit_retries: 0,
            ..Self::default()
        }
    }

    /// Retry budget for a failure class.
    pub fn budget(&self, class: FailureClass) -> u32 {
        match class {
            FailureClass::Auth => self.auth_retries,
            FailureClass::Transport => self.transport_retries,
            FailureClass::RateLimit => self.rate_limit_retries,
        }
    }

    /// Backoff before retry number `retry` (1-based) of a class.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..retry {
            delay = next_delay(delay, self);
        }
        delay.min(self.max_delay)
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}

/// Per-call retry bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct RetryState {
    auth: u32,
    transport: u32,
    rate_limit: u32,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return the retry number if budget remains.
    pub fn try_consume(&mut self, class: FailureClass, policy: &RetryPolicy) -> Option<u32> {
        let used = match class {
            FailureClass::Auth => &mut self.auth,
            FailureClass::Transport => &mut self.transport,
            FailureClass::RateLimit => &mut self.rate_limit,
        };
        if *used >= policy.budget(class) {
            return None;
        }
        *used += 1;
        Some(*used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(
            next_delay(Duration::from_secs(1), &policy),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(
            next_delay(Duration::from_secs(8), &policy),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn delay_for_follows_backoff_sequence() {
        let policy = RetryPolicy::default();
        let expected = [1, 2, 4, 8, 16, 30, 30];
        for (i, &secs) in expected.iter().enumerate() {
            assert_eq!(policy.delay_for(i as u32 + 1), Duration::from_secs(secs));
        }
    }

    #[test]
    fn budgets_are_tracked_per_class() {
        let policy = RetryPolicy::default();
        let mut state = RetryState::new();

        assert_eq!(state.try_consume(FailureClass::Auth, &policy), Some(1));
        assert_eq!(state.try_consume(FailureClass::Auth, &policy), None);

        assert_eq!(state.try_consume(FailureClass::Transport, &policy), Some(1));
        assert_eq!(state.try_consume(FailureClass::Transport, &policy), Some(2));
        assert_eq!(state.try_consume(FailureClass::Transport, &policy), None);

        assert_eq!(state.try_consume(FailureClass::RateLimit, &policy), Some(1));
    }

    #[test]
    fn none_policy_never_retries() {
        let policy = RetryPolicy::none();
        let mut state = RetryState::new();
        assert_eq!(state.try_consume(FailureClass::Auth, &policy), None);
        assert_eq!(state.try_consume(FailureClass::Transport, &policy), None);
        assert_eq!(state.try_consume(FailureClass::RateLimit, &policy), None);
    }
}
