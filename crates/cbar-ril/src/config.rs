//! Channel configuration
//!
//! Channels are selected by the `type` tag:
//!
//! ```toml
//! [channel]
//! type = "mock"
//! latency_ms = 20
//! radio_on = true
//! password = "0000"
//! active = ["OI", "AI"]
//! ```

use std::collections::HashSet;

use cbar_core::{is_valid_password, BarringCategory, Direction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::facility::from_facility_code;

/// Channel configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse channel config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown facility code: {0}")]
    UnknownFacility(String),

    #[error("More than one active {0} barring category")]
    ConflictingCategories(Direction),

    #[error("Facility {0} cannot be active on its own")]
    NotDirectional(String),

    #[error("Network password must be 4 to 8 characters")]
    InvalidPassword,
}

/// Channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelConfig {
    /// Simulated network for demos and tests
    Mock(MockConfig),
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

impl ChannelConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

/// Simulated network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency per command in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Subscription (SIM slot) the channel is bound to
    #[serde(default)]
    pub subscription: u8,
    /// Whether the radio starts powered on
    #[serde(default = "default_true")]
    pub radio_on: bool,
    /// Network-side barring password
    #[serde(default = "default_password")]
    pub password: String,
    /// Facility codes active at start-up (e.g. "OI", "AI")
    #[serde(default)]
    pub active: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_password() -> String {
    "0000".to_string()
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            subscription: 0,
            radio_on: default_true(),
            password: default_password(),
            active: Vec::new(),
        }
    }
}

impl MockConfig {
    /// Resolve and validate the initially active categories
    pub fn active_categories(&self) -> Result<HashSet<BarringCategory>, ConfigError> {
        let mut set = HashSet::new();
        let mut seen = HashSet::new();
        for code in &self.active {
            let category = from_facility_code(code)
                .ok_or_else(|| ConfigError::UnknownFacility(code.clone()))?;
            let direction = category
                .direction()
                .ok_or_else(|| ConfigError::NotDirectional(code.clone()))?;
            if !seen.insert(direction) {
                return Err(ConfigError::ConflictingCategories(direction));
            }
            set.insert(category);
        }
        Ok(set)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_password(&self.password) {
            return Err(ConfigError::InvalidPassword);
        }
        self.active_categories().map(|_| ())
    }
}
