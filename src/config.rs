use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activity::results::PlatformCapabilities;
use crate::error::ConfigError;
use crate::kernel::reactor::ReactorConfig;
use crate::kernel::time::TICK_MS;
use crate::sensor::hardware::NaturalOrientation;
use crate::sensor::sampler::{DEFAULT_SAMPLE_HZ, MAX_SAMPLE_HZ};

/// Host-provided settings for the bridge. Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Consumer tick cadence in milliseconds.
    pub tick_ms: u64,
    /// Initial sampling rate of both motion sensors.
    pub default_sample_hz: u32,
    pub natural_orientation: NaturalOrientation,
    /// Whether the host gates features behind runtime permission prompts.
    pub runtime_permissions: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            default_sample_hz: DEFAULT_SAMPLE_HZ,
            natural_orientation: NaturalOrientation::Portrait,
            runtime_permissions: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be at least 1".into()));
        }
        if self.default_sample_hz == 0 || self.default_sample_hz > MAX_SAMPLE_HZ {
            return Err(ConfigError::Invalid(format!(
                "default_sample_hz must be within 1..={}, got {}",
                MAX_SAMPLE_HZ, self.default_sample_hz
            )));
        }
        Ok(())
    }

    pub fn reactor(&self) -> ReactorConfig {
        ReactorConfig { tick_ms: self.tick_ms }
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            runtime_permissions: self.runtime_permissions,
        }
    }
}
