use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::kind::{SensorDelay, SensorType};
use super::measurement::RawSensorEvent;
use crate::error::SensorError;

/// Receives raw measurements from the sensor service, on whatever thread it uses.
pub trait SensorListener: Send + Sync {
    fn on_sensor_changed(&self, event: &RawSensorEvent<'_>);
}

/// Platform sensor subscription API.
pub trait SensorService: Send + Sync {
    fn has_sensor(&self, sensor: SensorType) -> bool;

    fn register_listener(
        &self,
        sensor: SensorType,
        delay: SensorDelay,
        listener: Arc<dyn SensorListener>,
    ) -> Result<(), SensorError>;

    /// Stops future callbacks. One already being delivered may still complete.
    fn unregister_listener(&self, sensor: SensorType);
}

/// How the device is held when its display reads upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NaturalOrientation {
    #[default]
    Portrait,
    Landscape,
}

pub trait OrientationSource: Send + Sync {
    fn natural_orientation(&self) -> NaturalOrientation;
}

impl OrientationSource for NaturalOrientation {
    fn natural_orientation(&self) -> NaturalOrientation {
        *self
    }
}
