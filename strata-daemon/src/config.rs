//! Node configuration.
//!
//! A JSON file with defaults for every field; unknown keys are rejected so a
//! typo fails loudly at startup instead of silently running defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_model::{ProtocolError, ProtocolParameters, ProtocolVersions, SHA256_CODE};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("batch_interval_seconds must be positive")]
    ZeroBatchInterval,

    #[error("observer_interval_seconds must be positive")]
    ZeroObserverInterval,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// One row of the protocol parameter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolEntry {
    pub starting_block: u64,
    pub max_operations_per_batch: usize,
    pub hash_algorithm_code: u64,
}

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Method segment of the DIDs this node serves (`did:<method>:...`).
    pub did_method_name: String,
    /// Period of the rooting tick.
    pub batch_interval_seconds: u64,
    /// Period of the ledger observer poll.
    pub observer_interval_seconds: u64,
    /// Protocol parameter table, ascending by starting block.
    pub protocol: Vec<ProtocolEntry>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            did_method_name: "strata".to_string(),
            batch_interval_seconds: 10,
            observer_interval_seconds: 1,
            protocol: vec![ProtocolEntry {
                starting_block: 0,
                max_operations_per_batch: 100,
                hash_algorithm_code: SHA256_CODE,
            }],
        }
    }
}

impl NodeConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_interval_seconds == 0 {
            return Err(ConfigError::ZeroBatchInterval);
        }
        if self.observer_interval_seconds == 0 {
            return Err(ConfigError::ZeroObserverInterval);
        }
        self.protocol_versions()?;
        Ok(())
    }

    /// The protocol table this config describes.
    pub fn protocol_versions(&self) -> Result<ProtocolVersions, ProtocolError> {
        ProtocolVersions::new(
            self.protocol
                .iter()
                .map(|entry| {
                    (
                        entry.starting_block,
                        ProtocolParameters {
                            max_operations_per_batch: entry.max_operations_per_batch,
                            hash_algorithm_code: entry.hash_algorithm_code,
                        },
                    )
                })
                .collect(),
        )
    }
}
