use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// The platform wall clock.
///
/// Every read is a `SystemTime::now()` call, so the value follows NTP
/// corrections and manual adjustments and can occasionally move backwards.
/// Prefer [`MonotonicClock`] unless ids must track the wall clock exactly.
///
/// A system clock set before 1970 reads as `0`.
///
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}
