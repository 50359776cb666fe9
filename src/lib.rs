//! A distributed unique 64-bit ID generator inspired by Snowflake
//!
//! ```rust
//! use flaki::IdGenerator;
//!
//! let g = IdGenerator::builder().component_id(5)?.node_id(1)?.build();
//! let id = g.next_valid_id();
//! println!("{}", id); // e.g. "1217998963835011072"
//! println!("{}", id.as_u64()); // as unsigned 64-bit integer
//!
//! match g.next_id() {
//!     Ok(id) => println!("{id}"),
//!     Err(err) => eprintln!("{err}"), // the system clock went backwards
//! }
//! # Ok::<(), flaki::ConfigError>(())
//! ```
//!
//! Each service instance embeds its own generator and mints IDs without coordinating with any
//! other instance. Instances running at the same time must be assigned distinct pairs of
//! component ID and node ID.
//!
//! # Field and bit layout
//!
//! This implementation produces identifiers with the following bit layout, from the most
//! significant bit to the least:
//!
//! ```text
//!  6 6 6 6 5 5 5 5 5 5 5 5 5 5 4 4 4 4 4 4 4 4 4 4 3 3 3 3 3 3 3 3
//!  3 2 1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     timestamp     |nod|component|          sequence           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  3 3 2 2 2 2 2 2 2 2 2 2 1 1 1 1 1 1 1 1 1 1
//!  1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0
//! ```
//!
//! Where:
//!
//! - The 42-bit `timestamp` field holds the milliseconds elapsed since the generator's start
//!   epoch (2017-01-01T00:00:00Z by default).
//! - The 2-bit `nod` field holds the node ID.
//! - The 5-bit `component` field holds the component ID.
//! - The 15-bit `sequence` field is reset to zero whenever the timestamp changes and incremented
//!   by one for each new ID generated within the same millisecond.
//!
//! The field widths and offsets are exported as constants ([`TIMESTAMP_SHIFT`],
//! [`NODE_ID_SHIFT`], [`COMPONENT_ID_SHIFT`], and friends) for consumers that extract fields
//! from raw integers.
//!
//! When the 32768 sequence values of a millisecond are used up, the generator waits until the
//! clock reports the next millisecond. When the clock moves backwards, [`IdGenerator::next_id`]
//! returns [`ClockRegressionError`] and [`IdGenerator::next_valid_id`] waits until the clock
//! catches up.
//!
//! The timestamp field runs out about 139 years after the start epoch (see
//! [`IdGenerator::epoch_validity`]). After that, the field overflows and newly generated IDs are
//! no longer unique.
//!
//! # Crate features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`Id`] (decimal string in human-readable formats,
//!   `u64` otherwise) and [`Config`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod id;
pub use id::{
    Id, COMPONENT_ID_BITS, COMPONENT_ID_SHIFT, MAX_COMPONENT_ID, MAX_NODE_ID, MAX_SEQUENCE,
    MAX_TIMESTAMP, NODE_ID_BITS, NODE_ID_SHIFT, SEQUENCE_BITS, TIMESTAMP_BITS, TIMESTAMP_SHIFT,
};

mod error;
pub use error::{ClockRegressionError, ConfigError, Error, ParseError};

pub mod generator;
pub use generator::{Builder, IdGenerator};

mod time_source;
pub use time_source::{StdSystemTime, TimeSource};

mod config;
pub use config::Config;
