//! Staleness policy for character records.
//!
//! A record is due when its `last_modified` is `NULL` (a failed refresh that
//! should be retried on the next pass) or older than [`CHARACTER_TTL_DAYS`]
//! relative to the moment the due set was last counted.

use chrono::{DateTime, Duration, Utc};

use crate::types::Timestamp;

/// Days after a successful refresh before a character is due again.
pub const CHARACTER_TTL_DAYS: i64 = 7;

/// Number of claims between two recounts of the due set.
pub const PROGRESS_RECOUNT_INTERVAL: u32 = 10;

/// `last_modified` sentinel for records that were never refreshed.
pub const NEVER_REFRESHED: Timestamp = DateTime::<Utc>::UNIX_EPOCH;

/// The refresh time-to-live as a chrono duration.
pub fn ttl() -> Duration {
    Duration::days(CHARACTER_TTL_DAYS)
}

/// Records last modified at or before the returned instant are due.
pub fn due_cutoff(counted_at: Timestamp) -> Timestamp {
    counted_at - ttl()
}

/// Whether a record with the given `last_modified` is due for `cutoff`.
pub fn is_due(last_modified: Option<Timestamp>, cutoff: Timestamp) -> bool {
    match last_modified {
        None => true,
        Some(ts) => ts <= cutoff,
    }
}
