use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::hardware::SensorService;
use super::kind::{SensorKind, SensorType};
use super::sampler::{SensorHost, SensorSampler};
use crate::error::SamplerError;

/// Event types a script can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Delivered by the view layer; only the subscription flag lives here.
    Multitouch,
    Accelerometer,
    Gyroscope,
}

impl EventType {
    pub const ALL: [EventType; 3] = [
        EventType::Multitouch,
        EventType::Accelerometer,
        EventType::Gyroscope,
    ];

    fn index(self) -> usize {
        match self {
            EventType::Multitouch => 0,
            EventType::Accelerometer => 1,
            EventType::Gyroscope => 2,
        }
    }
}

/// Owns one sampler per motion sensor and tracks which event types scripts want.
///
/// Subscriptions survive `pause()`/`resume()`: pausing stops the hardware but
/// remembers what was active so resuming can restart exactly that.
pub struct SensorManager {
    service: Arc<dyn SensorService>,
    accelerometer: SensorSampler,
    gyroscope: SensorSampler,
    active: Mutex<[bool; 3]>,
}

impl SensorManager {
    pub fn new(host: SensorHost) -> Self {
        Self {
            service: Arc::clone(&host.service),
            accelerometer: SensorSampler::new(SensorKind::ACCELEROMETER, host.clone()),
            gyroscope: SensorSampler::new(SensorKind::GYROSCOPE, host),
            active: Mutex::new([false; 3]),
        }
    }

    pub fn accelerometer(&self) -> &SensorSampler {
        &self.accelerometer
    }

    pub fn gyroscope(&self) -> &SensorSampler {
        &self.gyroscope
    }

    pub fn set_event_notification(&self, event: EventType, enable: bool) -> Result<(), SamplerError> {
        if enable {
            self.start(event)
        } else {
            self.stop(event);
            Ok(())
        }
    }

    pub fn is_active(&self, event: EventType) -> bool {
        self.active.lock()[event.index()]
    }

    /// Marks the event type active and starts its sampler. The flag is only set
    /// once the hardware accepted the subscription.
    pub fn start(&self, event: EventType) -> Result<(), SamplerError> {
        let mut active = self.active.lock();
        if active[event.index()] {
            return Ok(());
        }
        if let Some(sampler) = self.sampler(event) {
            sampler.start()?;
        }
        active[event.index()] = true;
        Ok(())
    }

    pub fn stop(&self, event: EventType) {
        let mut active = self.active.lock();
        if !active[event.index()] {
            return;
        }
        if let Some(sampler) = self.sampler(event) {
            sampler.stop();
        }
        active[event.index()] = false;
    }

    pub fn stop_all(&self) {
        for event in EventType::ALL {
            self.stop(event);
        }
    }

    /// Stops the hardware without forgetting subscriptions.
    pub fn pause(&self) {
        let _active = self.active.lock();
        self.accelerometer.stop();
        self.gyroscope.stop();
        info!("Sensor manager paused");
    }

    /// Restarts every sampler whose event type is still subscribed.
    pub fn resume(&self) {
        let active = self.active.lock();
        for event in EventType::ALL {
            if !active[event.index()] {
                continue;
            }
            if let Some(sampler) = self.sampler(event) {
                if let Err(e) = sampler.start() {
                    warn!("Failed to resume {:?}: {}", event, e);
                }
            }
        }
        info!("Sensor manager resumed");
    }

    pub fn set_accelerometer_interval(&self, hz: u32) -> Result<(), SamplerError> {
        self.accelerometer.set_interval_hz(hz)
    }

    pub fn set_gyroscope_interval(&self, hz: u32) -> Result<(), SamplerError> {
        self.gyroscope.set_interval_hz(hz)
    }

    pub fn has_accelerometer(&self) -> bool {
        self.service.has_sensor(SensorType::Accelerometer)
    }

    pub fn has_gyroscope(&self) -> bool {
        self.service.has_sensor(SensorType::Gyroscope)
    }

    fn sampler(&self, event: EventType) -> Option<&SensorSampler> {
        match event {
            EventType::Multitouch => None,
            EventType::Accelerometer => Some(&self.accelerometer),
            EventType::Gyroscope => Some(&self.gyroscope),
        }
    }
}
