//! Plain configuration record for services that load the generator identity from a file.

use chrono::{DateTime, Utc};

use crate::{generator::DEFAULT_START_EPOCH_MS, ConfigError, IdGenerator};

/// Identity and time origin of an [`IdGenerator`].
///
/// With the `serde` feature, this type can be embedded in a service configuration file. Missing
/// fields take their default values and `start_epoch` is written in RFC 3339:
///
/// ```rust
/// # #[cfg(feature = "serde")]
/// # {
/// let config: flaki::Config = serde_json::from_str(
///     r#"{ "component_id": 7, "node_id": 1, "start_epoch": "2020-01-01T00:00:00Z" }"#,
/// )?;
/// let g = flaki::IdGenerator::from_config(&config)?;
/// assert_eq!(g.component_id(), 7);
/// # }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Config {
    /// Component ID in `[0, 31]`.
    pub component_id: u8,

    /// Node ID in `[0, 3]`.
    pub node_id: u8,

    /// Zero point of the timestamp field.
    pub start_epoch: DateTime<Utc>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            component_id: 0,
            node_id: 0,
            start_epoch: default_start_epoch(),
        }
    }
}

impl Config {
    /// Checks every field in declaration order, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        IdGenerator::builder().config(self).map(drop)
    }
}

pub(crate) fn default_start_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(DEFAULT_START_EPOCH_MS)
        .expect("default start epoch must be a representable instant")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults to the builder defaults
    #[test]
    fn defaults_to_the_builder_defaults() {
        let config = Config::default();
        assert_eq!(config.component_id, 0);
        assert_eq!(config.node_id, 0);
        assert_eq!(config.start_epoch.to_rfc3339(), "2017-01-01T00:00:00+00:00");
        assert_eq!(config.validate(), Ok(()));
    }

    /// Reports the first invalid field
    #[test]
    fn reports_the_first_invalid_field() {
        let config = Config {
            component_id: 40,
            node_id: 9,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ComponentId(40)));

        let config = Config {
            node_id: 9,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NodeId(9)));
    }

    /// Deserializes partial documents with defaults
    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_documents_with_defaults() {
        let config: Config = serde_json::from_str(r#"{ "node_id": 2 }"#).unwrap();
        assert_eq!(
            config,
            Config {
                node_id: 2,
                ..Default::default()
            }
        );

        let config: Config =
            serde_json::from_str(r#"{ "start_epoch": "1960-01-01T00:00:00Z" }"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::StartEpoch(_))));

        assert!(serde_json::from_str::<Config>(r#"{ "worker_id": 2 }"#).is_err());
    }
}
