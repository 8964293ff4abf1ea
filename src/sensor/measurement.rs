use super::kind::SensorType;
use super::timestamp::SensorTimestamp;

/// A measurement as handed over by the hardware callback. The slice belongs to
/// the platform and is reused after the callback returns.
#[derive(Debug, Clone, Copy)]
pub struct RawSensorEvent<'a> {
    pub sensor_type: SensorType,
    pub accuracy: i32,
    pub timestamp: SensorTimestamp,
    pub values: &'a [f32],
}

/// Owned copy of the last raw measurement. One per sampler, overwritten in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorMeasurement {
    pub sensor_type: SensorType,
    pub accuracy: i32,
    pub timestamp: SensorTimestamp,
    pub values: [f32; 3],
}

impl SensorMeasurement {
    pub fn new(sensor_type: SensorType) -> Self {
        Self {
            sensor_type,
            accuracy: 0,
            timestamp: SensorTimestamp::default(),
            values: [0.0; 3],
        }
    }

    /// Copies as many axes as both sides have; missing axes keep their previous value.
    pub fn copy_from(&mut self, event: &RawSensorEvent<'_>) {
        self.sensor_type = event.sensor_type;
        self.accuracy = event.accuracy;
        self.timestamp = event.timestamp;
        for (dst, src) in self.values.iter_mut().zip(event.values) {
            *dst = *src;
        }
    }
}
