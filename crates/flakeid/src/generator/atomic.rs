use core::time::Duration;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::GeneratorConfig,
    error::Result,
    generator::{
        IdGenStatus, SnowflakeGenerator,
        state::{GeneratorState, Params, Step},
    },
    layout::{Identity, Layout},
    time::TimeSource,
};

/// Packed state of a generator that has not issued anything yet. Issued
/// state is `(elapsed << sequence_bits) | sequence`.
const NEVER: u64 = u64::MAX;

/// A lock-free Snowflake generator for multi-threaded use.
///
/// The last issued timestamp and sequence are packed into one [`AtomicU64`]
/// and advanced with compare-and-swap, so exactly one caller wins each
/// sequence increment. Losers re-read the state and the clock and try again.
///
/// This gives the same guarantees as [`LockSnowflakeGenerator`] (strictly
/// increasing ids, clock regression reported as an error, an exhausted
/// sequence waited out) but without fairness: under heavy contention an
/// unlucky caller may retry many times.
///
/// ## Features
/// - ✅ Thread-safe
/// - ❌ Fair access across threads
/// - ✅ Any valid [`Layout`]
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::LockSnowflakeGenerator
pub struct AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    params: Params,
    time: T,
}

impl<T> AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Validates `config` and creates a generator reading `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when a bit width, the
    /// datacenter id, the worker id or the epoch is out of range.
    ///
    /// # Example
    /// ```
    /// use flakeid::{AtomicSnowflakeGenerator, GeneratorConfig, MonotonicClock};
    ///
    /// let generator =
    ///     AtomicSnowflakeGenerator::new(GeneratorConfig::with_ids(3, 4), MonotonicClock::default())
    ///         .unwrap();
    /// let a = generator.generate().unwrap();
    /// let b = generator.generate().unwrap();
    /// assert!(a < b);
    /// ```
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn new(config: GeneratorConfig, time: T) -> Result<Self> {
        let params = Params::from_config(&config, &time)?;
        let state = AtomicU64::new(NEVER);
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(state),
            #[cfg(not(feature = "cache-padded"))]
            state,
            params,
            time,
        })
    }

    /// Generates the next id, waiting out an exhausted sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackward`] if the clock reads earlier than
    /// the last issued id.
    ///
    /// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> Result<u64> {
        loop {
            let current = self.state.load(Ordering::Acquire);
            // Read the clock after the state so a reading can never predate
            // the timestamp it is compared against.
            let now = self.time.current_millis();

            let (timestamp, sequence) =
                match self.unpack(current).step(now, self.params.layout.max_sequence())? {
                    Step::Issue {
                        timestamp,
                        sequence,
                    } => (timestamp, sequence),
                    Step::Exhausted { last_timestamp } => {
                        (self.params.wait_past(&self.time, last_timestamp), 0)
                    }
                };

            let elapsed = self.params.elapsed(timestamp)?;
            if self.try_commit(current, elapsed, sequence) {
                return Ok(self.params.compose(elapsed, sequence));
            }
            core::hint::spin_loop();
        }
    }

    /// Attempts to generate the next id without waiting for the clock.
    ///
    /// A lost compare-and-swap is retried immediately; only an exhausted
    /// sequence yields [`IdGenStatus::Pending`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackward`] if the clock reads earlier than
    /// the last issued id.
    ///
    /// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        loop {
            let current = self.state.load(Ordering::Acquire);
            let now = self.time.current_millis();

            match self.unpack(current).step(now, self.params.layout.max_sequence())? {
                Step::Issue {
                    timestamp,
                    sequence,
                } => {
                    let elapsed = self.params.elapsed(timestamp)?;
                    if self.try_commit(current, elapsed, sequence) {
                        let id = self.params.compose(elapsed, sequence);
                        return Ok(IdGenStatus::Ready { id });
                    }
                    core::hint::spin_loop();
                }
                Step::Exhausted { .. } => return Ok(IdGenStatus::Pending { yield_for: 1 }),
            }
        }
    }

    #[inline]
    fn unpack(&self, raw: u64) -> GeneratorState {
        if raw == NEVER {
            return GeneratorState::default();
        }
        GeneratorState {
            last_timestamp: Some(
                (raw >> self.params.layout.sequence_bits()) + self.params.epoch_millis,
            ),
            sequence: raw & self.params.layout.max_sequence(),
        }
    }

    #[inline]
    fn try_commit(&self, current: u64, elapsed: u64, sequence: u64) -> bool {
        // `elapsed` is bounded by the timestamp field, so the packed word
        // leaves the sign bit clear and never collides with `NEVER`.
        let next = (elapsed << self.params.layout.sequence_bits()) | sequence;
        self.state
            .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl<T> SnowflakeGenerator<T> for AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn new(config: GeneratorConfig, time: T) -> Result<Self> {
        Self::new(config, time)
    }

    fn generate(&self) -> Result<u64> {
        self.generate()
    }

    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.try_poll_id()
    }

    fn layout(&self) -> &Layout {
        &self.params.layout
    }

    fn identity(&self) -> &Identity {
        &self.params.identity
    }

    fn epoch(&self) -> Duration {
        Duration::from_millis(self.params.epoch_millis)
    }
}
