/// The outcome of a non-blocking generation attempt.
///
/// Returned by [`SnowflakeGenerator::try_poll_id`]:
///
/// - [`IdGenStatus::Ready`] carries a freshly issued id.
/// - [`IdGenStatus::Pending`] means the sequence for the current millisecond
///   is used up; nothing was issued and the generator is unchanged.
///
/// # Example
///
/// ```
/// use flakeid::{GeneratorConfig, IdGenStatus, LockSnowflakeGenerator, SnowflakeGenerator, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let config = GeneratorConfig::default().with_epoch(core::time::Duration::ZERO);
/// let generator = LockSnowflakeGenerator::new(config, FixedTime).unwrap();
/// match generator.try_poll_id().unwrap() {
///     IdGenStatus::Ready { id } => println!("ID: {id}"),
///     IdGenStatus::Pending { yield_for } => println!("Back off for {yield_for} ms"),
/// }
/// ```
///
/// [`SnowflakeGenerator::try_poll_id`]: crate::SnowflakeGenerator::try_poll_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique id was generated and is ready to use.
    Ready {
        /// The generated id.
        id: u64,
    },
    /// No id could be generated because the sequence has been exhausted for
    /// the current millisecond.
    Pending {
        /// Milliseconds to wait before the generator can issue again.
        yield_for: u64,
    },
}
