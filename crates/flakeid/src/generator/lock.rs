use core::time::Duration;
use std::sync::Arc;

use parking_lot::Mutex;
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

/// A lock-based Snowflake generator for multi-threaded use.
///
/// Every call takes a single mutex for its full duration, clock read
/// included, so callers are served one at a time and each sees the state the
/// previous one left. When a millisecond's sequence runs out, the caller
/// waits for the next millisecond while still holding the lock, stalling
/// every other caller of this generator too.
///
/// Clones share state and are the same logical generator.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Fair access across threads
/// - ✅ Any valid [`Layout`]
///
/// ## See Also
/// - [`AtomicSnowflakeGenerator`]
///
/// [`AtomicSnowflakeGenerator`]: crate::AtomicSnowflakeGenerator
pub struct LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<GeneratorState>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<GeneratorState>>,
    params: Params,
    time: T,
}

impl<T> LockSnowflakeGenerator<T>
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
    /// use flakeid::{GeneratorConfig, LockSnowflakeGenerator, MonotonicClock, SnowflakeGenerator};
    ///
    /// let config = GeneratorConfig::with_ids(1, 2).with_bits(5, 5, 12);
    /// let generator = LockSnowflakeGenerator::new(config, MonotonicClock::default()).unwrap();
    ///
    /// let id = generator.generate().unwrap();
    /// assert_eq!(generator.decompose(id).worker_id, 2);
    /// ```
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn new(config: GeneratorConfig, time: T) -> Result<Self> {
        let params = Params::from_config(&config, &time)?;
        let state = Mutex::new(GeneratorState::default());
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(state),
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
    /// # Example
    /// ```
    /// use flakeid::{Error, GeneratorConfig, LockSnowflakeGenerator, MonotonicClock};
    ///
    /// let generator =
    ///     LockSnowflakeGenerator::new(GeneratorConfig::default(), MonotonicClock::default()).unwrap();
    ///
    /// match generator.generate() {
    ///     Ok(id) => println!("ID: {id}"),
    ///     Err(Error::ClockMovedBackward { delta_millis }) => {
    ///         std::thread::sleep(std::time::Duration::from_millis(delta_millis));
    ///     }
    ///     Err(e) => panic!("Generator error: {e}"),
    /// }
    /// ```
    ///
    /// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate(&self) -> Result<u64> {
        let mut state = self.state.lock();
        let now = self.time.current_millis();

        let (timestamp, sequence) = match state.step(now, self.params.layout.max_sequence())? {
            Step::Issue {
                timestamp,
                sequence,
            } => (timestamp, sequence),
            Step::Exhausted { last_timestamp } => {
                (self.params.wait_past(&self.time, last_timestamp), 0)
            }
        };

        let id = self.params.pack(timestamp, sequence)?;
        state.commit(timestamp, sequence);
        Ok(id)
    }

    /// Attempts to generate the next id without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackward`] if the clock reads earlier than
    /// the last issued id.
    ///
    /// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let mut state = self.state.lock();
        let now = self.time.current_millis();

        match state.step(now, self.params.layout.max_sequence())? {
            Step::Issue {
                timestamp,
                sequence,
            } => {
                let id = self.params.pack(timestamp, sequence)?;
                state.commit(timestamp, sequence);
                Ok(IdGenStatus::Ready { id })
            }
            Step::Exhausted { .. } => Ok(IdGenStatus::Pending { yield_for: 1 }),
        }
    }
}

impl<T> Clone for LockSnowflakeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            params: self.params,
            time: self.time.clone(),
        }
    }
}

impl<T> SnowflakeGenerator<T> for LockSnowflakeGenerator<T>
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
