use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::hardware::{SensorListener, SensorService};
use super::kind::{SensorDelay, SensorType};
use super::measurement::RawSensorEvent;
use super::timestamp::{interval_nanos, SensorTimestamp};
use crate::error::SensorError;

/// Software stand-in for motion hardware: one thread per subscribed sensor,
/// pushing a slow synthetic wobble at a fixed cadence regardless of the delay hint.
pub struct SimulatedSensorService {
    period: Duration,
    available: Vec<SensorType>,
    timestamp_origin: i64,
    streams: Mutex<HashMap<SensorType, Arc<AtomicBool>>>,
}

impl SimulatedSensorService {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            available: vec![SensorType::Accelerometer, SensorType::Gyroscope],
            timestamp_origin: 0,
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Restricts which sensors this device claims to have.
    pub fn with_sensors(mut self, sensors: &[SensorType]) -> Self {
        self.available = sensors.to_vec();
        self
    }

    /// Starts the device clock at an arbitrary value, e.g. just below the wrap point.
    pub fn with_timestamp_origin(mut self, nanos: i64) -> Self {
        self.timestamp_origin = nanos;
        self
    }

    fn stop_stream(&self, sensor: SensorType) {
        if let Some(stop) = self.streams.lock().remove(&sensor) {
            stop.store(true, Ordering::Release);
        }
    }
}

impl SensorService for SimulatedSensorService {
    fn has_sensor(&self, sensor: SensorType) -> bool {
        self.available.contains(&sensor)
    }

    fn register_listener(
        &self,
        sensor: SensorType,
        delay: SensorDelay,
        listener: Arc<dyn SensorListener>,
    ) -> Result<(), SensorError> {
        if !self.has_sensor(sensor) {
            return Err(SensorError::Unavailable(sensor));
        }
        self.stop_stream(sensor);

        let stop = Arc::new(AtomicBool::new(false));
        self.streams.lock().insert(sensor, Arc::clone(&stop));

        let period = self.period;
        let origin = SensorTimestamp::from_nanos(self.timestamp_origin);
        debug!("Simulated {:?} stream at {:?} (hint {:?})", sensor, period, delay);

        thread::Builder::new()
            .name(format!("sim-{sensor:?}").to_lowercase())
            .spawn(move || {
                let clock = Instant::now();
                while !stop.load(Ordering::Acquire) {
                    thread::sleep(period);
                    if stop.load(Ordering::Acquire) {
                        break;
                    }
                    let t = clock.elapsed();
                    let phase = t.as_secs_f32();
                    let values = [phase.sin(), phase.cos(), 9.81];
                    listener.on_sensor_changed(&RawSensorEvent {
                        sensor_type: sensor,
                        accuracy: 3,
                        timestamp: origin.offset(interval_nanos(t)),
                        values: &values,
                    });
                }
            })
            .map_err(|e| SensorError::Registration {
                sensor,
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn unregister_listener(&self, sensor: SensorType) {
        self.stop_stream(sensor);
    }
}

impl Drop for SimulatedSensorService {
    fn drop(&mut self) {
        for (_, stop) in self.streams.lock().drain() {
            stop.store(true, Ordering::Release);
        }
    }
}
