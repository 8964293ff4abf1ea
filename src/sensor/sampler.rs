use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, trace, warn};

use super::hardware::{NaturalOrientation, OrientationSource, SensorListener, SensorService};
use super::kind::{SensorDelay, SensorKind};
use super::measurement::{RawSensorEvent, SensorMeasurement};
use super::timer::{ArmedTimer, TimerDriver};
use super::timestamp::{interval_nanos, nanos_to_seconds, SensorTimestamp};
use crate::error::SamplerError;
use crate::kernel::dispatcher::TaskDispatcher;
use crate::kernel::event::{MotionSample, MotionTask};
use crate::kernel::runtime::RuntimeStatus;

pub const DEFAULT_SAMPLE_HZ: u32 = 10;
/// 1 kHz; anything faster rounds down to a zero-millisecond interval.
pub const MAX_SAMPLE_HZ: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerPhase {
    Stopped,
    Starting,
    Running,
}

/// Collaborators a sampler needs from its host. Cheap to clone.
#[derive(Clone)]
pub struct SensorHost {
    pub dispatcher: Arc<TaskDispatcher>,
    pub status: Arc<RuntimeStatus>,
    pub service: Arc<dyn SensorService>,
    pub orientation: Arc<dyn OrientationSource>,
    /// Without a timer driver the owner calls [`SensorSampler::on_timer_elapsed`] itself.
    pub timer: Option<Arc<dyn TimerDriver>>,
}

struct MonitorState {
    phase: SamplerPhase,
    interval: Duration,
    measurement: SensorMeasurement,
    last_sample_timestamp: SensorTimestamp,
    has_measurement: bool,
    has_baseline_sample: bool,
    has_skipped_first_measurement: bool,
}

/// State shared between the hardware listener and the timer callback.
struct SamplerCore {
    kind: SensorKind,
    state: Mutex<MonitorState>,
    dispatcher: Arc<TaskDispatcher>,
    status: Arc<RuntimeStatus>,
    orientation: Arc<dyn OrientationSource>,
}

impl SensorListener for SamplerCore {
    fn on_sensor_changed(&self, event: &RawSensorEvent<'_>) {
        if event.sensor_type != self.kind.sensor_type {
            return;
        }

        let mut state = self.state.lock();
        // Late delivery after stop().
        if state.phase == SamplerPhase::Stopped {
            return;
        }

        // The first measurement typically predates start() and would inflate the first delta.
        if !state.has_skipped_first_measurement {
            state.has_skipped_first_measurement = true;
            return;
        }

        state.measurement.copy_from(event);
        state.has_measurement = true;
    }
}

impl SamplerCore {
    fn on_timer_elapsed(&self) -> Option<MotionSample> {
        let orientation = self.orientation.natural_orientation();

        let sample = {
            let mut state = self.state.lock();
            if state.phase != SamplerPhase::Running || !state.has_measurement {
                return None;
            }

            // First sample only establishes the baseline for delta time.
            if !state.has_baseline_sample {
                state.last_sample_timestamp = state.measurement.timestamp;
                state.has_baseline_sample = true;
                return None;
            }

            // Devices that skip a hardware sample resend the old one, and a sample
            // within half an interval would yield a tiny delta. Either way, pretend
            // it arrived exactly one interval after the previous one.
            let interval = interval_nanos(state.interval);
            let previous = state.last_sample_timestamp;
            let min_acceptable = previous.offset(interval / 2);
            if state.measurement.timestamp.compare(min_acceptable) != Ordering::Greater {
                state.measurement.timestamp = previous.offset(interval);
            }

            let delta = state.measurement.timestamp.subtract(previous);
            state.last_sample_timestamp = state.measurement.timestamp;

            self.remap(&state.measurement.values, orientation, nanos_to_seconds(delta))
        };

        if self.status.is_running() {
            self.dispatcher.send(Box::new(MotionTask {
                channel: self.kind.channel,
                sample,
            }));
        } else {
            trace!("{:?} sample dropped, runtime not running", self.kind.sensor_type);
        }
        Some(sample)
    }

    /// Portrait-relative axes: landscape-natural devices swap X/Y and flip Y.
    fn remap(
        &self,
        values: &[f32; 3],
        orientation: NaturalOrientation,
        delta_time: f64,
    ) -> MotionSample {
        let portrait = orientation == NaturalOrientation::Portrait;
        let (x_index, y_index) = if portrait { (0, 1) } else { (1, 0) };

        let x = self.kind.normalize(values[x_index]);
        let mut y = self.kind.normalize(values[y_index]);
        let z = self.kind.normalize(values[2]);
        if !portrait {
            y = -y;
        }

        MotionSample { x, y, z, delta_time }
    }
}

/// Turns an irregular hardware measurement stream into fixed-interval samples.
///
/// `start`/`stop`/`set_interval` are serialized by an internal lifecycle lock;
/// the hardware and timer callbacks only touch the shared monitor state.
pub struct SensorSampler {
    core: Arc<SamplerCore>,
    service: Arc<dyn SensorService>,
    timer_driver: Option<Arc<dyn TimerDriver>>,
    armed_timer: Mutex<Option<Box<dyn ArmedTimer>>>,
}

impl SensorSampler {
    pub fn new(kind: SensorKind, host: SensorHost) -> Self {
        let interval = Duration::from_millis(u64::from(1000 / DEFAULT_SAMPLE_HZ));
        Self {
            core: Arc::new(SamplerCore {
                kind,
                state: Mutex::new(MonitorState {
                    phase: SamplerPhase::Stopped,
                    interval,
                    measurement: SensorMeasurement::new(kind.sensor_type),
                    last_sample_timestamp: SensorTimestamp::default(),
                    has_measurement: false,
                    has_baseline_sample: false,
                    has_skipped_first_measurement: false,
                }),
                dispatcher: host.dispatcher,
                status: host.status,
                orientation: host.orientation,
            }),
            service: host.service,
            timer_driver: host.timer,
            armed_timer: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.core.kind
    }

    pub fn phase(&self) -> SamplerPhase {
        self.core.state.lock().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == SamplerPhase::Running
    }

    pub fn interval(&self) -> Duration {
        self.core.state.lock().interval
    }

    pub fn interval_hz(&self) -> u32 {
        let ms = self.interval().as_millis().max(1);
        u32::try_from(1000 / ms).unwrap_or(0)
    }

    /// Subscribes to the hardware and arms the sample timer. No-op if already running.
    ///
    /// On a registration failure the sampler stays stopped and may be started again later.
    pub fn start(&self) -> Result<(), SamplerError> {
        let mut armed = self.armed_timer.lock();
        self.start_locked(&mut armed)
    }

    /// Unsubscribes and disarms the timer. No-op if already stopped.
    pub fn stop(&self) {
        let mut armed = self.armed_timer.lock();
        self.stop_locked(&mut armed);
    }

    /// Sets the sample rate in hertz (1..=1000). The interval is whole milliseconds.
    pub fn set_interval_hz(&self, hz: u32) -> Result<(), SamplerError> {
        if hz == 0 || hz > MAX_SAMPLE_HZ {
            return Err(SamplerError::InvalidInterval(format!(
                "{hz} Hz is outside 1..={MAX_SAMPLE_HZ}"
            )));
        }
        self.set_interval(Duration::from_millis(u64::from(1000 / hz)))
    }

    /// Changes the sample interval. While running this restarts the sampler so the
    /// hardware delay hint and the timer period change together.
    pub fn set_interval(&self, interval: Duration) -> Result<(), SamplerError> {
        if interval < Duration::from_millis(1) {
            return Err(SamplerError::InvalidInterval(format!(
                "{interval:?} is shorter than 1ms"
            )));
        }

        let mut armed = self.armed_timer.lock();
        let was_running = {
            let state = self.core.state.lock();
            if state.interval == interval {
                return Ok(());
            }
            state.phase != SamplerPhase::Stopped
        };

        if was_running {
            self.stop_locked(&mut armed);
        }
        self.core.state.lock().interval = interval;
        info!(
            "{:?} sampler interval set to {:?}",
            self.core.kind.sensor_type, interval
        );
        if was_running {
            self.start_locked(&mut armed)?;
        }
        Ok(())
    }

    /// Resamples the latest measurement. Normally driven by the armed timer.
    pub fn on_timer_elapsed(&self) -> Option<MotionSample> {
        self.core.on_timer_elapsed()
    }

    fn start_locked(&self, armed: &mut Option<Box<dyn ArmedTimer>>) -> Result<(), SamplerError> {
        let kind = self.core.kind;
        let interval = {
            let mut state = self.core.state.lock();
            if state.phase != SamplerPhase::Stopped {
                return Ok(());
            }
            state.phase = SamplerPhase::Starting;
            state.has_skipped_first_measurement = false;
            state.has_measurement = false;
            state.has_baseline_sample = false;
            state.interval
        };

        // The service may deliver synchronously, so the state lock must not be held here.
        let delay = SensorDelay::for_interval(interval);
        let listener: Arc<dyn SensorListener> = self.core.clone();
        if let Err(e) = self.service.register_listener(kind.sensor_type, delay, listener) {
            warn!("{:?} sampler failed to start: {}", kind.sensor_type, e);
            self.core.state.lock().phase = SamplerPhase::Stopped;
            return Err(e.into());
        }
        self.core.state.lock().phase = SamplerPhase::Running;

        if let Some(driver) = &self.timer_driver {
            let core = Arc::clone(&self.core);
            *armed = Some(driver.arm(
                interval,
                Arc::new(move || {
                    core.on_timer_elapsed();
                }),
            ));
        }

        info!(
            "{:?} sampler started. Interval: {:?}, delay: {:?}",
            kind.sensor_type, interval, delay
        );
        Ok(())
    }

    fn stop_locked(&self, armed: &mut Option<Box<dyn ArmedTimer>>) {
        {
            let mut state = self.core.state.lock();
            if state.phase == SamplerPhase::Stopped {
                return;
            }
            state.phase = SamplerPhase::Stopped;
        }

        self.service.unregister_listener(self.core.kind.sensor_type);
        if let Some(mut timer) = armed.take() {
            timer.disarm();
        }
        info!("{:?} sampler stopped", self.core.kind.sensor_type);
    }
}

impl Drop for SensorSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SensorSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSampler")
            .field("kind", &self.core.kind)
            .field("phase", &self.phase())
            .field("interval", &self.interval())
            .finish()
    }
}
