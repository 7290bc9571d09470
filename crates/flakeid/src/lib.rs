//! # flakeid
//!
//! Snowflake-style 64-bit identifiers with a bit layout chosen at
//! construction time.
//!
//! An identifier packs, from the most significant usable bit down:
//!
//! ```text
//!  Bit Index:  63    62 ...                                           0
//!              +---+-----------+---------------+-----------+------------+
//!  Field:      | 0 | timestamp | datacenter_id | worker_id | sequence   |
//!              +---+-----------+---------------+-----------+------------+
//! ```
//!
//! The sign bit is never set. The timestamp is the number of milliseconds
//! elapsed since a configurable epoch, and the sequence distinguishes ids
//! issued within the same millisecond by the same generator.
//!
//! ```
//! use flakeid::{GeneratorConfig, LockSnowflakeGenerator, MonotonicClock, SnowflakeGenerator};
//!
//! let config = GeneratorConfig::default()
//!     .with_datacenter_id(1)
//!     .with_worker_id(2);
//! let generator = LockSnowflakeGenerator::new(config, MonotonicClock::default()).unwrap();
//!
//! let a = generator.generate().unwrap();
//! let b = generator.generate().unwrap();
//! assert!(a < b);
//!
//! let parts = generator.decompose(b);
//! assert_eq!(parts.datacenter_id, 1);
//! assert_eq!(parts.worker_id, 2);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod generator;
mod layout;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::time::*;
