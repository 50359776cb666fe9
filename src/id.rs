use std::{fmt, str};

use chrono::{DateTime, Duration, Utc};

use crate::ParseError;

/// Width of the component ID field.
pub const COMPONENT_ID_BITS: u32 = 5;

/// Width of the node ID field.
pub const NODE_ID_BITS: u32 = 2;

/// Width of the sequence field.
pub const SEQUENCE_BITS: u32 = 15;

/// Width of the timestamp field (elapsed milliseconds since the start epoch).
pub const TIMESTAMP_BITS: u32 = 64 - COMPONENT_ID_BITS - NODE_ID_BITS - SEQUENCE_BITS;

/// Bit offset of the component ID field.
pub const COMPONENT_ID_SHIFT: u32 = SEQUENCE_BITS;

/// Bit offset of the node ID field.
pub const NODE_ID_SHIFT: u32 = SEQUENCE_BITS + COMPONENT_ID_BITS;

/// Bit offset of the timestamp field.
pub const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + COMPONENT_ID_BITS + NODE_ID_BITS;

/// Largest component ID (31).
pub const MAX_COMPONENT_ID: u8 = (1 << COMPONENT_ID_BITS) - 1;

/// Largest node ID (3).
pub const MAX_NODE_ID: u8 = (1 << NODE_ID_BITS) - 1;

/// Largest sequence number (32767).
pub const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;

/// Largest timestamp field value, in milliseconds.
pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Represents a 64-bit unique identifier.
///
/// The ordering of `Id` values is the ordering of the underlying `u64`, which sorts identifiers
/// by timestamp first, then by node ID, component ID, and sequence.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Id(u64);

impl Id {
    /// Zero ID.
    pub const ZERO: Self = Self(0);

    /// Max ID (18446744073709551615).
    pub const MAX: Self = Self(u64::MAX);

    /// Creates an ID from the field values.
    ///
    /// # Panics
    ///
    /// Panics if any argument is out of the range of its field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flaki::Id;
    ///
    /// let id = Id::from_fields(1, 2, 3, 4);
    /// assert_eq!(id.as_u64(), (1 << 22) | (2 << 20) | (3 << 15) | 4);
    /// assert_eq!(id.node_id(), 2);
    /// ```
    pub const fn from_fields(timestamp: u64, node_id: u8, component_id: u8, sequence: u16) -> Self {
        if timestamp > MAX_TIMESTAMP
            || node_id > MAX_NODE_ID
            || component_id > MAX_COMPONENT_ID
            || sequence > MAX_SEQUENCE
        {
            panic!("invalid field value");
        }

        Self(
            (timestamp << TIMESTAMP_SHIFT)
                | ((node_id as u64) << NODE_ID_SHIFT)
                | ((component_id as u64) << COMPONENT_ID_SHIFT)
                | sequence as u64,
        )
    }

    /// Returns the underlying integer.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp field: milliseconds elapsed since the generator's start epoch.
    pub const fn timestamp(&self) -> u64 {
        self.0 >> TIMESTAMP_SHIFT
    }

    /// Returns the node ID field.
    pub const fn node_id(&self) -> u8 {
        ((self.0 >> NODE_ID_SHIFT) & MAX_NODE_ID as u64) as u8
    }

    /// Returns the component ID field.
    pub const fn component_id(&self) -> u8 {
        ((self.0 >> COMPONENT_ID_SHIFT) & MAX_COMPONENT_ID as u64) as u8
    }

    /// Returns the sequence field.
    pub const fn sequence(&self) -> u16 {
        (self.0 & MAX_SEQUENCE as u64) as u16
    }

    /// Returns the instant encoded in the timestamp field, given the start epoch of the generator
    /// that produced this ID.
    ///
    /// The result is exact to the millisecond only for IDs generated before the generator's
    /// [`epoch_validity`](crate::IdGenerator::epoch_validity).
    pub fn created_at(&self, start_epoch: DateTime<Utc>) -> DateTime<Utc> {
        start_epoch + Duration::milliseconds(self.timestamp() as i64)
    }
}

impl fmt::Display for Id {
    /// Returns the base-10 decimal representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl str::FromStr for Id {
    type Err = ParseError;

    /// Creates an object from the base-10 decimal representation.
    ///
    /// Only plain ASCII digits are accepted; signs and surrounding whitespace are rejected.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        if src.is_empty() || !src.bytes().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::InvalidDigit);
        }
        src.parse::<u64>()
            .map(Self)
            .map_err(|_| ParseError::Overflow)
    }
}

impl From<Id> for u64 {
    fn from(src: Id) -> Self {
        src.0
    }
}

impl From<u64> for Id {
    fn from(src: u64) -> Self {
        Self(src)
    }
}

impl From<Id> for String {
    fn from(src: Id) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Id {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

impl TryFrom<&str> for Id {
    type Error = ParseError;

    fn try_from(src: &str) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Id};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Id {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.collect_str(self)
            } else {
                serializer.serialize_u64(self.0)
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Id {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_any(VisitorImpl)
            } else {
                deserializer.deserialize_u64(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Id;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a 64-bit ID as a decimal string or an unsigned integer")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Id(value))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::Id;
        use serde_test::{assert_de_tokens, assert_tokens, Configure, Token};

        /// Serializes and deserializes prepared cases correctly
        #[test]
        fn serializes_and_deserializes_prepared_cases_correctly() {
            let cases = [
                ("0", 0u64),
                ("43429887016108032", 43_429_887_016_108_032),
                ("18446744073709551615", u64::MAX),
            ];

            for (text, value) in cases {
                let e = text.parse::<Id>().unwrap();
                assert_tokens(&e.readable(), &[Token::Str(text)]);
                assert_tokens(&e.compact(), &[Token::U64(value)]);
            }
        }

        /// Accepts integers in human-readable formats
        #[test]
        fn accepts_integers_in_human_readable_formats() {
            let id: Id = serde_json::from_str("43429887016108032").unwrap();
            assert_eq!(id.as_u64(), 43_429_887_016_108_032);

            let id: Id = serde_json::from_str("\"43429887016108032\"").unwrap();
            assert_eq!(id.as_u64(), 43_429_887_016_108_032);

            assert_eq!(
                serde_json::to_string(&id).unwrap(),
                "\"43429887016108032\""
            );
            assert_de_tokens(&Id::from(7).readable(), &[Token::Str("7")]);
        }
    }
}
