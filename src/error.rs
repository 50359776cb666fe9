use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::id::{MAX_COMPONENT_ID, MAX_NODE_ID};

/// Error building a generator from an invalid configuration.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ConfigError {
    #[error("the component id must be in [0..{max}], got {0}", max = MAX_COMPONENT_ID)]
    ComponentId(u8),

    #[error("the node id must be in [0..{max}], got {0}", max = MAX_NODE_ID)]
    NodeId(u8),

    #[error("the epoch must be between 1970-01-01 and 2262-01-01, got {0}")]
    StartEpoch(DateTime<Utc>),
}

/// Error returned when the time source reports an instant earlier than the last one used.
///
/// The condition is transient on a sane clock; retry, or use
/// [`IdGenerator::next_valid_id`](crate::IdGenerator::next_valid_id) to wait it out.
#[derive(Error, Clone, Copy, Eq, PartialEq, Hash, Debug)]
#[error("clock moved backwards, refusing to generate ids for {millis} ms")]
pub struct ClockRegressionError {
    pub(crate) millis: u64,
}

impl ClockRegressionError {
    /// Returns the magnitude of the regression in milliseconds.
    pub const fn millis(&self) -> u64 {
        self.millis
    }
}

/// Error parsing an invalid string representation of [`Id`](crate::Id).
#[derive(Error, Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum ParseError {
    #[error("invalid string representation: expected ascii digits only")]
    InvalidDigit,

    #[error("invalid string representation: number too large for 64 bits")]
    Overflow,
}

/// Umbrella error for callers that handle every failure of this crate in one place.
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ClockRegression(#[from] ClockRegressionError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Formats messages with offending values
    #[test]
    fn formats_messages_with_offending_values() {
        assert_eq!(
            ConfigError::ComponentId(32).to_string(),
            "the component id must be in [0..31], got 32"
        );
        assert_eq!(
            ConfigError::NodeId(4).to_string(),
            "the node id must be in [0..3], got 4"
        );
        assert_eq!(
            ClockRegressionError { millis: 5 }.to_string(),
            "clock moved backwards, refusing to generate ids for 5 ms"
        );
    }

    /// Converts into umbrella error
    #[test]
    fn converts_into_umbrella_error() {
        let e: Error = ClockRegressionError { millis: 1 }.into();
        assert_eq!(e, Error::ClockRegression(ClockRegressionError { millis: 1 }));
        assert_eq!(e.to_string(), "clock moved backwards, refusing to generate ids for 1 ms");

        let e: Error = ParseError::Overflow.into();
        assert!(matches!(e, Error::Parse(ParseError::Overflow)));
    }
}
