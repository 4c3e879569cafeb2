//! Configuration of harvest cycles, reservoirs and custom events.

use std::fs;
use std::io;
use std::path::Path;

use harvest_common::{TimeDelta, Timestamp};
use harvest_log::LogConfig;
use serde::{Deserialize, Serialize};

use crate::{EventReservoir, HarvestState, MAX_RESERVOIR_CAPACITY, ReservoirError};

/// Indicates config related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile(#[source] io::Error),
    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml(#[source] serde_yaml::Error),
    /// Parsing JSON failed.
    #[error("could not parse json config file")]
    BadJson(#[source] serde_json::Error),
    /// A value was parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

/// Defaults for the harvest cycle before the collector provides its own values.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Desired number of sampled units of work per harvest cycle.
    pub target_per_cycle: u64,
    /// Length of a harvest cycle in microseconds.
    pub frequency: TimeDelta,
}

impl HarvestConfig {
    /// Creates a harvest state for a connection established at `connect_timestamp`.
    pub fn state(&self, connect_timestamp: Timestamp, now: Timestamp) -> HarvestState {
        HarvestState::new(
            connect_timestamp,
            self.frequency,
            self.target_per_cycle,
            now,
        )
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_per_cycle: 10,
            frequency: TimeDelta::from_secs(60),
        }
    }
}

/// Limits of the event reservoir filled by sampled units of work.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ReservoirConfig {
    /// Maximum number of events stored per harvest cycle.
    pub max_samples_stored: usize,
}

impl ReservoirConfig {
    /// Creates an empty reservoir with the configured capacity.
    pub fn reservoir(&self) -> Result<EventReservoir, ReservoirError> {
        EventReservoir::new(self.max_samples_stored)
    }
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            max_samples_stored: 10_000,
        }
    }
}

/// Controls the collection of custom events.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomEventsConfig {
    /// Enables recording of custom events.
    pub enabled: bool,
    /// Maximum number of custom events stored per harvest cycle.
    pub max_samples_stored: usize,
}

impl Default for CustomEventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_samples_stored: 10_000,
        }
    }
}

/// The full sampling configuration.
///
/// All sections are optional and fall back to their defaults.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LogConfig,
    /// Harvest cycle defaults.
    pub harvest: HarvestConfig,
    /// Event reservoir limits.
    pub reservoir: ReservoirConfig,
    /// Custom event settings.
    pub custom_events: CustomEventsConfig,
}

impl Config {
    /// Parses and validates a YAML configuration.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s).map_err(ConfigError::BadYaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::BadJson)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// Files with a `.json` extension are parsed as JSON, everything else as YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(ConfigError::CouldNotOpenFile)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Checks values that parse correctly but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_capacity(
            "reservoir.max_samples_stored",
            self.reservoir.max_samples_stored,
        )?;
        check_capacity(
            "custom_events.max_samples_stored",
            self.custom_events.max_samples_stored,
        )?;

        if self.harvest.frequency.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "harvest.frequency",
                reason: "must be positive".to_owned(),
            });
        }

        Ok(())
    }
}

fn check_capacity(field: &'static str, capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 || capacity > MAX_RESERVOIR_CAPACITY {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be between 1 and {MAX_RESERVOIR_CAPACITY}"),
        });
    }

    Ok(())
}
