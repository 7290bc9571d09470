use core::cmp::Ordering;

use crate::{
    config::GeneratorConfig,
    error::{ConfigError, Error, Result},
    generator::Backoff,
    layout::{Components, Identity, Layout},
    time::TimeSource,
};

/// The immutable half of a generator: everything fixed at construction.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Params {
    pub(crate) layout: Layout,
    pub(crate) identity: Identity,
    pub(crate) epoch_millis: u64,
    pub(crate) backoff: Backoff,
}

impl Params {
    /// Validates `config` and checks the epoch against one reading of `time`.
    pub(crate) fn from_config<T: TimeSource>(config: &GeneratorConfig, time: &T) -> Result<Self> {
        let (layout, identity) = config.validate()?;
        let epoch_millis = config.validate_epoch(&layout, time.current_millis())?;
        Ok(Self {
            layout,
            identity,
            epoch_millis,
            backoff: config.backoff,
        })
    }

    /// Packs an absolute timestamp and a sequence into an id.
    ///
    /// Fails instead of wrapping once the elapsed time no longer fits the
    /// timestamp field.
    #[inline]
    pub(crate) fn pack(&self, timestamp: u64, sequence: u64) -> Result<u64> {
        let elapsed = self.elapsed(timestamp)?;
        Ok(self.compose(elapsed, sequence))
    }

    /// Packs an already bounded elapsed time and a sequence into an id.
    #[inline]
    pub(crate) fn compose(&self, elapsed: u64, sequence: u64) -> u64 {
        self.layout.compose(&Components {
            timestamp: elapsed,
            datacenter_id: self.identity.datacenter_id(),
            worker_id: self.identity.worker_id(),
            sequence,
        })
    }

    /// Milliseconds from the epoch to `timestamp`, bounded by the layout's
    /// `max_timestamp`.
    #[inline]
    pub(crate) fn elapsed(&self, timestamp: u64) -> Result<u64> {
        let Some(elapsed) = timestamp.checked_sub(self.epoch_millis) else {
            // Only reachable on the first call, if the clock fell behind the
            // epoch after construction.
            return Err(clock_behind(timestamp, self.epoch_millis));
        };
        if elapsed > self.layout.max_timestamp() {
            return Err(horizon_exceeded(elapsed, self.layout.max_timestamp()));
        }
        Ok(elapsed)
    }

    /// Blocks until `time` reads strictly later than `last`, returning the
    /// new reading.
    #[cold]
    #[inline(never)]
    pub(crate) fn wait_past<T: TimeSource>(&self, time: &T, last: u64) -> u64 {
        #[cfg(feature = "tracing")]
        tracing::debug!(last, "sequence exhausted, waiting for the next millisecond");

        loop {
            let now = time.current_millis();
            if now > last {
                return now;
            }
            self.backoff.wait();
        }
    }
}

/// What the next id should be, given the current state and clock reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Issue an id with these fields.
    Issue { timestamp: u64, sequence: u64 },
    /// Every sequence value of `last_timestamp` has been issued.
    Exhausted { last_timestamp: u64 },
}

/// The mutable half of a generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct GeneratorState {
    /// Absolute millisecond of the last issued id; `None` until the first.
    pub(crate) last_timestamp: Option<u64>,
    pub(crate) sequence: u64,
}

impl GeneratorState {
    /// Decides the next step without mutating anything.
    ///
    /// # Errors
    ///
    /// [`Error::ClockMovedBackward`] when `now` is earlier than the last
    /// issued timestamp.
    #[inline]
    pub(crate) fn step(&self, now: u64, max_sequence: u64) -> Result<Step> {
        let Some(last) = self.last_timestamp else {
            return Ok(Step::Issue {
                timestamp: now,
                sequence: 0,
            });
        };
        match now.cmp(&last) {
            Ordering::Greater => Ok(Step::Issue {
                timestamp: now,
                sequence: 0,
            }),
            Ordering::Equal if self.sequence < max_sequence => Ok(Step::Issue {
                timestamp: now,
                sequence: self.sequence + 1,
            }),
            Ordering::Equal => Ok(Step::Exhausted {
                last_timestamp: last,
            }),
            Ordering::Less => Err(clock_behind(now, last)),
        }
    }

    #[inline]
    pub(crate) fn commit(&mut self, timestamp: u64, sequence: u64) {
        self.last_timestamp = Some(timestamp);
        self.sequence = sequence;
    }
}

#[cold]
#[inline(never)]
fn clock_behind(now: u64, last: u64) -> Error {
    let delta_millis = last - now;
    #[cfg(feature = "tracing")]
    tracing::warn!(now, last, delta_millis, "clock moved backwards");
    Error::ClockMovedBackward { delta_millis }
}

#[cold]
#[inline(never)]
fn horizon_exceeded(elapsed_millis: u64, max_millis: u64) -> Error {
    #[cfg(feature = "tracing")]
    tracing::error!(
        elapsed_millis,
        max_millis,
        "timestamp field exhausted, no further ids can be issued"
    );
    ConfigError::HorizonExceeded {
        elapsed_millis,
        max_millis,
    }
    .into()
}
