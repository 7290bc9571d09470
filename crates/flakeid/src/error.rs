use thiserror::Error;

/// A result type defaulting to this crate's [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `flakeid` can produce.
///
/// There are exactly two kinds. [`Error::InvalidConfiguration`] is raised
/// while building a generator, or by every call once the clock has run past
/// the layout's horizon, and indicates a deployment bug.
/// [`Error::ClockMovedBackward`] is raised per call and leaves the generator
/// untouched, so the caller may retry once the clock has caught up.
///
/// Sequence exhaustion is not an error: the generator waits for the next
/// millisecond instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// A bit width, datacenter id, worker id or epoch is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The clock reported a time earlier than the last issued id.
    #[error("clock moved backwards; refusing to generate id for {delta_millis} ms")]
    ClockMovedBackward {
        /// How far behind the last issued timestamp the clock is, in
        /// milliseconds.
        delta_millis: u64,
    },
}

/// The reason a configuration was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("datacenter id width must be within 0..={max} bits, got {bits}")]
    DatacenterBits { bits: u8, max: u8 },

    #[error("worker id width must be within 0..={max} bits, got {bits}")]
    WorkerBits { bits: u8, max: u8 },

    #[error("sequence width must be within {min}..={max} bits, got {bits}")]
    SequenceBits { bits: u8, min: u8, max: u8 },

    #[error("datacenter id can't be greater than {max}, got {id}")]
    DatacenterId { id: u64, max: u64 },

    #[error("worker id can't be greater than {max}, got {id}")]
    WorkerId { id: u64, max: u64 },

    #[error("epoch ({epoch_millis} ms) is later than the current time ({now_millis} ms)")]
    EpochInFuture { epoch_millis: u64, now_millis: u64 },

    #[error(
        "{elapsed_millis} ms have elapsed since the epoch, more than the {max_millis} ms the timestamp field can hold"
    )]
    HorizonExceeded { elapsed_millis: u64, max_millis: u64 },
}
