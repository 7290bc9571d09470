use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    generator::Backoff,
    layout::{
        DEFAULT_DATACENTER_BITS, DEFAULT_SEQUENCE_BITS, DEFAULT_WORKER_BITS, Identity, Layout,
    },
    time::DEFAULT_EPOCH,
};

/// Everything needed to build a generator.
///
/// The defaults reproduce the classic split: epoch 2019-01-01 UTC, 4
/// datacenter bits, 4 worker bits, 12 sequence bits, datacenter and worker id
/// `0`, and a busy-polling [`Backoff::Spin`].
///
/// Nothing is validated until a generator is built from the config (or
/// [`GeneratorConfig::validate`] is called), so a config can be assembled
/// field by field.
///
/// With the `serde` feature the config deserializes with every field
/// optional, the epoch given as `epoch_millis`:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// let config: flakeid::GeneratorConfig =
///     serde_json::from_str(r#"{ "epoch_millis": 0, "worker_id": 3 }"#).unwrap();
/// assert_eq!(config.worker_id, 3);
/// assert_eq!(config.sequence_bits, 12);
/// # }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneratorConfig {
    /// Reference instant, as a duration since 1970-01-01 UTC. Must not be
    /// later than the time the generator is built.
    #[cfg_attr(feature = "serde", serde(rename = "epoch_millis", with = "epoch_millis"))]
    pub epoch: Duration,
    pub datacenter_bits: u8,
    pub worker_bits: u8,
    pub sequence_bits: u8,
    pub datacenter_id: u64,
    pub worker_id: u64,
    /// What to do between clock reads while waiting out an exhausted
    /// sequence.
    pub backoff: Backoff,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            datacenter_bits: DEFAULT_DATACENTER_BITS,
            worker_bits: DEFAULT_WORKER_BITS,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
            datacenter_id: 0,
            worker_id: 0,
            backoff: Backoff::default(),
        }
    }
}

impl GeneratorConfig {
    /// A default config for the given partition.
    pub fn with_ids(datacenter_id: u64, worker_id: u64) -> Self {
        Self::default()
            .with_datacenter_id(datacenter_id)
            .with_worker_id(worker_id)
    }

    #[must_use]
    pub fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    /// Sets all three field widths at once.
    #[must_use]
    pub fn with_bits(mut self, datacenter_bits: u8, worker_bits: u8, sequence_bits: u8) -> Self {
        self.datacenter_bits = datacenter_bits;
        self.worker_bits = worker_bits;
        self.sequence_bits = sequence_bits;
        self
    }

    #[must_use]
    pub fn with_datacenter_id(mut self, datacenter_id: u64) -> Self {
        self.datacenter_id = datacenter_id;
        self
    }

    #[must_use]
    pub fn with_worker_id(mut self, worker_id: u64) -> Self {
        self.worker_id = worker_id;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Validates the bit widths, then the ids against the maxima those widths
    /// allow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] describing the first field out
    /// of range.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn validate(&self) -> Result<(Layout, Identity)> {
        let layout = Layout::new(self.datacenter_bits, self.worker_bits, self.sequence_bits)?;
        let identity = Identity::new(&layout, self.datacenter_id, self.worker_id)?;
        Ok((layout, identity))
    }

    /// Checks the epoch against the current time and returns it in
    /// milliseconds.
    pub(crate) fn validate_epoch(&self, layout: &Layout, now_millis: u64) -> Result<u64> {
        let epoch_millis = self.epoch_millis();
        let Some(elapsed_millis) = now_millis.checked_sub(epoch_millis) else {
            return Err(ConfigError::EpochInFuture {
                epoch_millis,
                now_millis,
            }
            .into());
        };
        if elapsed_millis > layout.max_timestamp() {
            return Err(ConfigError::HorizonExceeded {
                elapsed_millis,
                max_millis: layout.max_timestamp(),
            }
            .into());
        }
        Ok(epoch_millis)
    }

    /// The epoch in milliseconds since 1970-01-01 UTC, saturating at
    /// `u64::MAX`.
    pub fn epoch_millis(&self) -> u64 {
        u64::try_from(self.epoch.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(feature = "serde")]
mod epoch_millis {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(epoch: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(epoch.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
