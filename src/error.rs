use thiserror::Error;

use crate::sensor::kind::SensorType;

/// Failures reported by a hardware sensor service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("no {0:?} sensor on this device")]
    Unavailable(SensorType),
    #[error("failed to register {sensor:?} listener: {reason}")]
    Registration { sensor: SensorType, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error("invalid sample interval: {0}")]
    InvalidInterval(String),
    #[error(transparent)]
    Hardware(#[from] SensorError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
