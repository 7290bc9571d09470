use core::time::Duration;

use crate::{
    config::GeneratorConfig,
    error::Result,
    generator::IdGenStatus,
    layout::{Components, Identity, Layout},
    time::TimeSource,
};

/// The common interface of every Snowflake generator in this crate.
pub trait SnowflakeGenerator<T>: Sized
where
    T: TimeSource,
{
    /// Validates `config` and creates a generator reading `time`.
    ///
    /// The clock is read once to check that the epoch is not in the future.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if any field of `config` is out
    /// of range.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    fn new(config: GeneratorConfig, time: T) -> Result<Self>;

    /// Generates the next id.
    ///
    /// Ids from one generator strictly increase as long as the clock does not
    /// regress. When the sequence for the current millisecond is used up, this
    /// blocks (following the configured [`Backoff`]) until the clock ticks
    /// over. The wait cannot be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackward`] if the clock reads earlier than
    /// the last issued id. Nothing is issued and the generator is unchanged,
    /// so the call can be retried once the clock has caught up.
    ///
    /// Returns [`Error::InvalidConfiguration`] with
    /// [`ConfigError::HorizonExceeded`] once the time since the epoch no
    /// longer fits the timestamp field. This is permanent for the layout.
    ///
    /// [`Backoff`]: crate::Backoff
    /// [`ConfigError::HorizonExceeded`]: crate::ConfigError::HorizonExceeded
    /// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    fn generate(&self) -> Result<u64>;

    /// Attempts to generate the next id without blocking.
    ///
    /// Behaves like [`SnowflakeGenerator::generate`] except that an exhausted
    /// sequence returns [`IdGenStatus::Pending`] instead of waiting.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`SnowflakeGenerator::generate`].
    fn try_poll_id(&self) -> Result<IdGenStatus>;

    fn layout(&self) -> &Layout;

    fn identity(&self) -> &Identity;

    /// The epoch as a duration since 1970-01-01 UTC.
    fn epoch(&self) -> Duration;

    /// Splits an id into its fields under this generator's layout.
    fn decompose(&self, id: u64) -> Components {
        self.layout().decompose(id)
    }

    /// The instant an id was issued at, as a duration since 1970-01-01 UTC.
    fn timestamp_of(&self, id: u64) -> Duration {
        self.epoch() + Duration::from_millis(self.decompose(id).timestamp)
    }
}
