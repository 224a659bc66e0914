//! Per-pass progress counters and the cancellation handle.

use std::time::{Duration, Instant};

use covdb_core::staleness::{self, PROGRESS_RECOUNT_INTERVAL};
use covdb_core::types::Timestamp;
use tokio_util::sync::CancellationToken;

/// Tallies of terminal outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub updated: u64,
    pub reset: u64,
    pub deleted: u64,
    pub write_failures: u64,
}

/// Display-only progress of a pass.
///
/// The due count is re-derived every [`PROGRESS_RECOUNT_INTERVAL`] claims,
/// starting with the first.
#[derive(Debug)]
pub struct Progress {
    countdown: u32,
    cutoff: Timestamp,
    total: i64,
    current: i64,
    processed: u64,
    tally: Tally,
    started: Instant,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            countdown: 0,
            cutoff: staleness::NEVER_REFRESHED,
            total: 0,
            current: 0,
            processed: 0,
            tally: Tally::default(),
            started: Instant::now(),
        }
    }

    /// Reset for a new pass over another collection.
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    /// Whether this iteration should recount. Advances the countdown.
    pub fn tick(&mut self) -> bool {
        if self.countdown == 0 {
            self.countdown = PROGRESS_RECOUNT_INTERVAL - 1;
            true
        } else {
            self.countdown -= 1;
            false
        }
    }

    /// Record a fresh count of due records taken at `counted_at`.
    pub fn recount(&mut self, counted_at: Timestamp, due: i64) {
        self.cutoff = staleness::due_cutoff(counted_at);
        self.total = self.current + due;
    }

    pub fn cutoff(&self) -> Timestamp {
        self.cutoff
    }

    /// Count one claimed record.
    pub fn claimed(&mut self) {
        self.current += 1;
        self.processed += 1;
        // A concurrent seeder can make the estimate run short.
        if self.current > self.total {
            self.total = self.current;
        }
    }

    pub fn tally_mut(&mut self) -> &mut Tally {
        &mut self.tally
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn remaining(&self) -> i64 {
        (self.total - self.current).max(0)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Records per second since the pass started.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// State threaded through a refresh run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub cancel: CancellationToken,
    pub progress: Progress,
}

impl RunContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            progress: Progress::new(),
        }
    }
}
