use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a caller waits between clock reads once the sequence for the current
/// millisecond is used up.
///
/// The generator holds its state while waiting, so this only trades CPU for
/// wake-up latency. Ids are identical whichever strategy is picked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Backoff {
    /// Busy-poll the clock with a spin-loop hint. Lowest latency.
    #[default]
    Spin,
    /// Yield the thread to the OS scheduler between reads.
    Yield,
    /// Sleep for the given duration between reads. Keep it well under a
    /// millisecond or callers will overshoot the next tick.
    Sleep(Duration),
}

impl Backoff {
    /// Performs one wait.
    #[inline]
    pub fn wait(&self) {
        match self {
            Self::Spin => core::hint::spin_loop(),
            Self::Yield => std::thread::yield_now(),
            Self::Sleep(pause) => std::thread::sleep(*pause),
        }
    }
}
