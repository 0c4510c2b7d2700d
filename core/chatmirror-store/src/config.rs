//! Store configuration.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Configuration for a [`ModelStore`](crate::ModelStore).
///
/// ```
/// use chatmirror_store::StoreConfig;
///
/// let config = StoreConfig::from_toml_str("event_buffer = 64").unwrap();
/// assert_eq!(config.event_buffer, 64);
/// assert_eq!(config.large_model_warning, StoreConfig::default().large_model_warning);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Capacity of the broadcast notification channel.
    pub event_buffer: usize,
    /// Log a warning once when a collection grows past this many items.
    pub large_model_warning: usize,
    /// Log every published notification at debug level.
    pub log_events: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_buffer: 1024,
            large_model_warning: 5000,
            log_events: false,
        }
    }
}

impl StoreConfig {
    /// Parses a config from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }
}
