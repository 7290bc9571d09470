use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Bits available to the fields; the sign bit is never populated.
pub const USABLE_BITS: u8 = 63;
/// Widest allowed datacenter id field.
pub const MAX_DATACENTER_BITS: u8 = 10;
/// Widest allowed worker id field.
pub const MAX_WORKER_BITS: u8 = 10;
/// Narrowest allowed sequence field.
pub const MIN_SEQUENCE_BITS: u8 = 1;
/// Widest allowed sequence field.
pub const MAX_SEQUENCE_BITS: u8 = 20;

/// Default datacenter id width.
pub const DEFAULT_DATACENTER_BITS: u8 = 4;
/// Default worker id width.
pub const DEFAULT_WORKER_BITS: u8 = 4;
/// Default sequence width (4096 ids per millisecond).
pub const DEFAULT_SEQUENCE_BITS: u8 = 12;

const fn mask(bits: u8) -> u64 {
    (1u64 << bits) - 1
}

/// The bit geometry of an identifier.
///
/// A layout is validated once and then never changes. Every derived value
/// (field maxima and shift offsets) is computed up front so the generation hot
/// path is plain shifts and masks.
///
/// The timestamp field takes every usable bit the other three fields leave
/// over, so with the default 4/4/12 split it is 43 bits wide.
///
/// ## Bit layout
///
/// ```text
///  Bit Index:  63   62 ..     timestamp_shift .. datacenter_shift .. worker_shift ..   0
///              +---+----------------+-----------------+-------------+----------------+
///  Field:      | 0 | timestamp      | datacenter_id   | worker_id   | sequence       |
///              +---+----------------+-----------------+-------------+----------------+
/// ```
///
/// # Example
///
/// ```
/// use flakeid::{Components, Layout};
///
/// let layout = Layout::new(5, 5, 12).unwrap();
/// assert_eq!(layout.timestamp_bits(), 41);
/// assert_eq!(layout.max_worker_id(), 31);
///
/// let parts = Components { timestamp: 1_000, datacenter_id: 3, worker_id: 7, sequence: 42 };
/// let id = layout.compose(&parts);
/// assert_eq!(layout.decompose(id), parts);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    timestamp_bits: u8,
    datacenter_bits: u8,
    worker_bits: u8,
    sequence_bits: u8,

    timestamp_shift: u8,
    datacenter_shift: u8,
    worker_shift: u8,

    max_timestamp: u64,
    max_datacenter_id: u64,
    max_worker_id: u64,
    max_sequence: u64,
}

impl Default for Layout {
    /// The 43/4/4/12 layout: roughly 278 years of millisecond range, 256
    /// partitions and 4096 ids per millisecond per partition.
    fn default() -> Self {
        Self::derive(
            DEFAULT_DATACENTER_BITS,
            DEFAULT_WORKER_BITS,
            DEFAULT_SEQUENCE_BITS,
        )
    }
}

impl Layout {
    /// Validates the field widths and derives the layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] (wrapped in
    /// [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration))
    /// when `datacenter_bits` or `worker_bits` exceed 10, or when
    /// `sequence_bits` is outside `1..=20`.
    pub fn new(datacenter_bits: u8, worker_bits: u8, sequence_bits: u8) -> Result<Self> {
        if datacenter_bits > MAX_DATACENTER_BITS {
            return Err(ConfigError::DatacenterBits {
                bits: datacenter_bits,
                max: MAX_DATACENTER_BITS,
            }
            .into());
        }
        if worker_bits > MAX_WORKER_BITS {
            return Err(ConfigError::WorkerBits {
                bits: worker_bits,
                max: MAX_WORKER_BITS,
            }
            .into());
        }
        if !(MIN_SEQUENCE_BITS..=MAX_SEQUENCE_BITS).contains(&sequence_bits) {
            return Err(ConfigError::SequenceBits {
                bits: sequence_bits,
                min: MIN_SEQUENCE_BITS,
                max: MAX_SEQUENCE_BITS,
            }
            .into());
        }
        Ok(Self::derive(datacenter_bits, worker_bits, sequence_bits))
    }

    // Callers guarantee the widths are in range, so the timestamp keeps at
    // least 23 bits and no shift reaches 64.
    const fn derive(datacenter_bits: u8, worker_bits: u8, sequence_bits: u8) -> Self {
        let timestamp_bits = USABLE_BITS - datacenter_bits - worker_bits - sequence_bits;
        Self {
            timestamp_bits,
            datacenter_bits,
            worker_bits,
            sequence_bits,
            worker_shift: sequence_bits,
            datacenter_shift: sequence_bits + worker_bits,
            timestamp_shift: sequence_bits + worker_bits + datacenter_bits,
            max_timestamp: mask(timestamp_bits),
            max_datacenter_id: mask(datacenter_bits),
            max_worker_id: mask(worker_bits),
            max_sequence: mask(sequence_bits),
        }
    }

    pub const fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    pub const fn datacenter_bits(&self) -> u8 {
        self.datacenter_bits
    }

    pub const fn worker_bits(&self) -> u8 {
        self.worker_bits
    }

    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    pub const fn timestamp_shift(&self) -> u8 {
        self.timestamp_shift
    }

    pub const fn datacenter_shift(&self) -> u8 {
        self.datacenter_shift
    }

    pub const fn worker_shift(&self) -> u8 {
        self.worker_shift
    }

    /// Largest elapsed-millisecond value the timestamp field can hold.
    pub const fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }

    pub const fn max_datacenter_id(&self) -> u64 {
        self.max_datacenter_id
    }

    pub const fn max_worker_id(&self) -> u64 {
        self.max_worker_id
    }

    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    /// Number of ids one generator can issue within a single millisecond.
    pub const fn ids_per_millisecond(&self) -> u64 {
        self.max_sequence + 1
    }

    /// How long after the epoch the timestamp field stays representable.
    ///
    /// Past the horizon generators stop issuing ids and return
    /// [`ConfigError::HorizonExceeded`] on every call.
    pub const fn horizon(&self) -> Duration {
        Duration::from_millis(self.max_timestamp)
    }

    /// Packs components into an identifier. Each component is truncated to
    /// its field width, so the sign bit is always clear.
    pub const fn compose(&self, parts: &Components) -> u64 {
        ((parts.timestamp & self.max_timestamp) << self.timestamp_shift)
            | ((parts.datacenter_id & self.max_datacenter_id) << self.datacenter_shift)
            | ((parts.worker_id & self.max_worker_id) << self.worker_shift)
            | (parts.sequence & self.max_sequence)
    }

    /// Splits an identifier back into its components.
    pub const fn decompose(&self, id: u64) -> Components {
        Components {
            timestamp: (id >> self.timestamp_shift) & self.max_timestamp,
            datacenter_id: (id >> self.datacenter_shift) & self.max_datacenter_id,
            worker_id: (id >> self.worker_shift) & self.max_worker_id,
            sequence: id & self.max_sequence,
        }
    }
}

/// The four fields of an identifier.
///
/// `timestamp` is the number of milliseconds since the generator's epoch, not
/// since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Components {
    pub timestamp: u64,
    pub datacenter_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

/// The partition a generator issues ids for.
///
/// Distinct generators must be given distinct identities for their ids to be
/// globally unique. Assigning identities is the deployment's job; this type
/// only checks that they fit the layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Identity {
    datacenter_id: u64,
    worker_id: u64,
}

impl Identity {
    /// Validates `datacenter_id` and `worker_id` against `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DatacenterId`] or [`ConfigError::WorkerId`] when
    /// an id does not fit its field.
    pub fn new(layout: &Layout, datacenter_id: u64, worker_id: u64) -> Result<Self> {
        if datacenter_id > layout.max_datacenter_id() {
            return Err(ConfigError::DatacenterId {
                id: datacenter_id,
                max: layout.max_datacenter_id(),
            }
            .into());
        }
        if worker_id > layout.max_worker_id() {
            return Err(ConfigError::WorkerId {
                id: worker_id,
                max: layout.max_worker_id(),
            }
            .into());
        }
        Ok(Self {
            datacenter_id,
            worker_id,
        })
    }

    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }
}
