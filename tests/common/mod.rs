#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use sensorlink::error::SensorError;
use sensorlink::kernel::dispatcher::TaskDispatcher;
use sensorlink::kernel::event::{RuntimeEvent, ScriptRuntime, TaskContext};
use sensorlink::kernel::runtime::RuntimeStatus;
use sensorlink::kernel::time::Tick;
use sensorlink::sensor::hardware::{NaturalOrientation, SensorListener, SensorService};
use sensorlink::sensor::kind::{SensorDelay, SensorType};
use sensorlink::sensor::measurement::RawSensorEvent;
use sensorlink::sensor::sampler::SensorHost;
use sensorlink::sensor::timer::{ArmedTimer, TimerCallback, TimerDriver};
use sensorlink::sensor::timestamp::SensorTimestamp;

/// Sensor service whose "hardware" is driven by the test.
#[derive(Default)]
pub struct FakeSensorService {
    listeners: Mutex<HashMap<SensorType, Arc<dyn SensorListener>>>,
    pub registrations: Mutex<Vec<(SensorType, SensorDelay)>>,
    pub unregistrations: Mutex<Vec<SensorType>>,
    pub fail_registration: AtomicBool,
    pub missing: Mutex<Vec<SensorType>>,
}

impl FakeSensorService {
    pub fn push(&self, sensor: SensorType, timestamp: i64, values: [f32; 3]) {
        let listener = self.listeners.lock().get(&sensor).cloned();
        if let Some(listener) = listener {
            listener.on_sensor_changed(&RawSensorEvent {
                sensor_type: sensor,
                accuracy: 3,
                timestamp: SensorTimestamp(timestamp),
                values: &values,
            });
        }
    }

    /// The listener currently subscribed, kept by the caller to simulate a late callback.
    pub fn listener(&self, sensor: SensorType) -> Option<Arc<dyn SensorListener>> {
        self.listeners.lock().get(&sensor).cloned()
    }

    pub fn last_delay(&self) -> Option<SensorDelay> {
        self.registrations.lock().last().map(|(_, delay)| *delay)
    }
}

impl SensorService for FakeSensorService {
    fn has_sensor(&self, sensor: SensorType) -> bool {
        !self.missing.lock().contains(&sensor)
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
        if self.fail_registration.load(Ordering::SeqCst) {
            return Err(SensorError::Registration {
                sensor,
                reason: "service busy".into(),
            });
        }
        self.registrations.lock().push((sensor, delay));
        self.listeners.lock().insert(sensor, listener);
        Ok(())
    }

    fn unregister_listener(&self, sensor: SensorType) {
        self.unregistrations.lock().push(sensor);
        self.listeners.lock().remove(&sensor);
    }
}

/// Timer driver that only fires when the test says so.
#[derive(Default)]
pub struct ManualTimer {
    pub armed_periods: Mutex<Vec<Duration>>,
    pub disarmed: Arc<AtomicUsize>,
    callback: Mutex<Option<TimerCallback>>,
}

impl ManualTimer {
    pub fn fire(&self) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl TimerDriver for ManualTimer {
    fn arm(&self, period: Duration, callback: TimerCallback) -> Box<dyn ArmedTimer> {
        self.armed_periods.lock().push(period);
        *self.callback.lock() = Some(callback);
        Box::new(ManualArmed {
            disarmed: Arc::clone(&self.disarmed),
        })
    }
}

struct ManualArmed {
    disarmed: Arc<AtomicUsize>,
}

impl ArmedTimer for ManualArmed {
    fn disarm(&mut self) {
        self.disarmed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripting runtime that keeps everything it is handed.
#[derive(Default)]
pub struct RecordingRuntime {
    pub events: Vec<RuntimeEvent>,
}

impl ScriptRuntime for RecordingRuntime {
    fn dispatch(&mut self, event: RuntimeEvent) -> anyhow::Result<()> {
        self.events.push(event);
        Ok(())
    }
}

/// Dispatcher, runtime status, fake hardware and manual timer wired together.
pub struct Rig {
    pub dispatcher: Arc<TaskDispatcher>,
    pub status: Arc<RuntimeStatus>,
    pub service: Arc<FakeSensorService>,
    pub timer: Arc<ManualTimer>,
}

impl Rig {
    pub fn new() -> Self {
        let status = Arc::new(RuntimeStatus::new());
        status.start();
        Self {
            dispatcher: Arc::new(TaskDispatcher::new()),
            status,
            service: Arc::new(FakeSensorService::default()),
            timer: Arc::new(ManualTimer::default()),
        }
    }

    pub fn host(&self, orientation: NaturalOrientation) -> SensorHost {
        SensorHost {
            dispatcher: Arc::clone(&self.dispatcher),
            status: Arc::clone(&self.status),
            service: self.service.clone(),
            orientation: Arc::new(orientation),
            timer: Some(self.timer.clone()),
        }
    }

    /// Runs everything queued so far against a fresh recording runtime.
    pub fn drain(&self) -> Vec<RuntimeEvent> {
        let mut runtime = RecordingRuntime::default();
        let mut ctx = TaskContext::new(&mut runtime, Tick::new());
        self.dispatcher.drain_and_execute_all(&mut ctx);
        runtime.events
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
