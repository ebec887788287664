// Wall-clock helpers.
//
// IMPORTANT: these use SystemTime::now() which is NON-DETERMINISTIC and
// must never feed consensus-critical computation. The dispatcher always
// works from the parent block's timestamp; only the mempool admission
// checks (advisory by design) and diagnostics may use these.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

#[inline]
pub fn get_current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Incorrect time returned from get_current_time")
}

// Return timestamp in seconds
// SAFETY: non-consensus operation, admission control and logging only
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}
