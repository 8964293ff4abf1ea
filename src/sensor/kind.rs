use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::kernel::event::MotionChannel;

/// Hardware sensor identifier understood by the platform sensor service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    Accelerometer,
    Gyroscope,
}

/// Coarse rate hint handed to the sensor service. Devices treat it as a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorDelay {
    Normal,
    Ui,
    Game,
    Fastest,
}

impl SensorDelay {
    pub fn for_interval(interval: Duration) -> Self {
        let ms = interval.as_millis();
        if ms >= 200 {
            SensorDelay::Normal
        } else if ms >= 60 {
            SensorDelay::Ui
        } else if ms >= 20 {
            SensorDelay::Game
        } else {
            SensorDelay::Fastest
        }
    }
}

/// Everything that distinguishes one motion sensor from another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorKind {
    pub sensor_type: SensorType,
    pub channel: MotionChannel,
    /// Every raw axis value is divided by this.
    pub divisor: f64,
    /// Negate every axis after scaling.
    pub invert_axes: bool,
}

impl SensorKind {
    /// Raw readings are in m/s^2; scripts expect roughly g with inverted axes.
    pub const ACCELEROMETER: SensorKind = SensorKind {
        sensor_type: SensorType::Accelerometer,
        channel: MotionChannel::Accelerometer,
        divisor: 10.0,
        invert_axes: true,
    };

    pub const GYROSCOPE: SensorKind = SensorKind {
        sensor_type: SensorType::Gyroscope,
        channel: MotionChannel::Gyroscope,
        divisor: 1.0,
        invert_axes: false,
    };

    pub(crate) fn normalize(&self, raw: f32) -> f64 {
        let value = f64::from(raw) / self.divisor;
        if self.invert_axes {
            -value
        } else {
            value
        }
    }
}
