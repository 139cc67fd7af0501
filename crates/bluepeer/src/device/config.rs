//! Device configuration
//!
//! A configuration can be built in code, loaded from a JSON file, or both:
//! fields missing from the file keep their defaults.

use crate::device::types::BdAddr;
use crate::error::Error;
use crate::hci::constants::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfiguration {
    pub name: String,
    /// Static random address programmed with LE Set Random Address
    #[serde(deserialize_with = "deserialize_address")]
    pub address: Option<BdAddr>,
    pub classic_enabled: bool,
    pub le_enabled: bool,
    pub connect_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

impl Default for DeviceConfiguration {
    fn default() -> Self {
        Self {
            name: "Bluepeer".to_string(),
            address: None,
            classic_enabled: true,
            le_enabled: true,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
        }
    }
}

fn deserialize_address<'de, D>(deserializer: D) -> Result<Option<BdAddr>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    text.map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}

impl DeviceConfiguration {
    /// Load a configuration from a JSON string
    pub fn load_from_str(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::load_from_str(&json)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.classic_enabled && !self.le_enabled {
            return Err(Error::Config(
                "at least one of classic_enabled or le_enabled must be set".into(),
            ));
        }
        if let Some(address) = &self.address {
            if !address.is_static_random() {
                return Err(Error::Config(format!(
                    "{} is not a static random address",
                    address
                )));
            }
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
