use core::time::Duration;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::time::TimeSource;

/// Millisecond counter shared between every clone and the ticker thread.
#[derive(Debug)]
struct SharedTicker {
    elapsed: AtomicU64,
}

/// A clock that never goes backwards.
///
/// The wall-clock time is sampled once, at construction. From then on the
/// clock advances with a monotonic timer (`Instant`), so NTP corrections, VM
/// migrations and manual adjustments of the system clock do not affect it.
///
/// A background thread ticks a shared atomic counter once per millisecond, so
/// reading the clock is a single atomic load with no syscall. Clones share the
/// ticker; the thread exits after the last clone is dropped.
///
/// # Example
///
/// ```
/// use flakeid::{MonotonicClock, SystemClock, TimeSource};
///
/// let clock = MonotonicClock::default();
/// let a = clock.current_millis();
/// std::thread::sleep(std::time::Duration::from_millis(5));
/// let b = clock.current_millis();
///
/// // The ticker may lag a sleep by a millisecond or so, but never regresses.
/// assert!(b >= a);
/// ```
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTicker>,
    start_millis: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Starts a clock anchored at the current wall-clock time.
    ///
    /// # Panics
    ///
    /// Panics if the ticker thread cannot be spawned.
    pub fn new() -> Self {
        let start = Instant::now();
        let start_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| since.as_millis() as u64);

        let inner = Arc::new(SharedTicker {
            elapsed: AtomicU64::new(0),
        });

        let weak_inner = Arc::downgrade(&inner);
        thread::Builder::new()
            .name("flakeid-clock".into())
            .spawn(move || {
                let mut tick = 0;

                loop {
                    let Some(inner_ref) = weak_inner.upgrade() else {
                        break;
                    };

                    // Absolute target of the next tick
                    let target = start + Duration::from_millis(tick);

                    let now = Instant::now();
                    if now < target {
                        thread::sleep(target - now);
                    }

                    // Oversleeping skips ticks rather than drifting
                    let now_ms = start.elapsed().as_millis() as u64;
                    inner_ref.elapsed.store(now_ms, Ordering::Relaxed);

                    tick = now_ms + 1;
                }
            })
            .expect("failed to spawn clock ticker thread");

        Self {
            inner,
            start_millis,
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the wall-clock time at construction plus the monotonic time
    /// elapsed since.
    fn current_millis(&self) -> u64 {
        self.start_millis + self.inner.elapsed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemClock;

    #[test]
    fn starts_near_wall_clock() {
        let clock = MonotonicClock::new();
        let wall = SystemClock.current_millis();
        let mono = clock.current_millis();
        assert!(wall.abs_diff(mono) < 1_000, "wall {wall}, mono {mono}");
    }

    #[test]
    fn advances_and_never_regresses() {
        let clock = MonotonicClock::new();
        let first = clock.current_millis();
        let mut last = first;
        let deadline = Instant::now() + Duration::from_millis(50);
        while Instant::now() < deadline {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
        assert!(last > first);
    }

    #[test]
    fn clones_share_the_ticker() {
        let clock = MonotonicClock::new();
        let clone = clock.clone();
        thread::sleep(Duration::from_millis(5));
        drop(clock);
        let a = clone.current_millis();
        thread::sleep(Duration::from_millis(5));
        assert!(clone.current_millis() > a);
    }
}
