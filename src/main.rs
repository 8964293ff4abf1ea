use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sensorlink::config::BridgeConfig;
use sensorlink::kernel::dispatcher::TaskDispatcher;
use sensorlink::kernel::event::{MotionSample, RuntimeEvent, ScriptRuntime};
use sensorlink::kernel::reactor::Reactor;
use sensorlink::kernel::runtime::RuntimeStatus;
use sensorlink::sensor::manager::{EventType, SensorManager};
use sensorlink::sensor::sampler::SensorHost;
use sensorlink::sensor::simulated::SimulatedSensorService;
use sensorlink::sensor::timer::TokioTimer;

/// Hardware cadence of the simulated device, deliberately unrelated to the sample rate.
const HARDWARE_PERIOD: Duration = Duration::from_millis(8);
const RUN_FOR: Duration = Duration::from_secs(3);

#[derive(Default)]
struct Channel {
    samples: u64,
    total_delta: f64,
    min_delta: f64,
}

impl Channel {
    fn record(&mut self, sample: &MotionSample) {
        if self.samples == 0 || sample.delta_time < self.min_delta {
            self.min_delta = sample.delta_time;
        }
        self.samples += 1;
        self.total_delta += sample.delta_time;
    }

    fn average(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_delta / self.samples as f64
        }
    }
}

/// Stands in for the scripting runtime: logs and tallies what it receives.
#[derive(Default)]
struct LoggingRuntime {
    accelerometer: Channel,
    gyroscope: Channel,
}

impl ScriptRuntime for LoggingRuntime {
    fn dispatch(&mut self, event: RuntimeEvent) -> anyhow::Result<()> {
        match &event {
            RuntimeEvent::Accelerometer(s) => self.accelerometer.record(s),
            RuntimeEvent::Gyroscope(s) => self.gyroscope.record(s),
        }
        tracing::debug!("{}", serde_json::to_string(&event)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::load(&path)?,
        None => BridgeConfig::default(),
    };
    tracing::info!("Sensorlink booting with {:?}", config);

    let dispatcher = Arc::new(TaskDispatcher::new());
    let status = Arc::new(RuntimeStatus::new());
    let timer = TokioTimer::current().ok_or_else(|| anyhow::anyhow!("no tokio runtime"))?;

    let manager = SensorManager::new(SensorHost {
        dispatcher: Arc::clone(&dispatcher),
        status: Arc::clone(&status),
        service: Arc::new(SimulatedSensorService::new(HARDWARE_PERIOD)),
        orientation: Arc::new(config.natural_orientation),
        timer: Some(Arc::new(timer)),
    });
    manager.set_accelerometer_interval(config.default_sample_hz)?;
    manager.set_gyroscope_interval(config.default_sample_hz)?;

    status.start();
    manager.start(EventType::Accelerometer)?;
    manager.start(EventType::Gyroscope)?;

    let mut reactor = Reactor::new(
        LoggingRuntime::default(),
        dispatcher,
        Arc::clone(&status),
        config.reactor(),
    );

    let shutdown = CancellationToken::new();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(RUN_FOR).await;
        stop.cancel();
    });

    tracing::info!("Kernel Loop Active for {:?}.", RUN_FOR);
    reactor.run(shutdown).await;
    manager.stop_all();

    for (name, channel) in [
        ("accelerometer", &reactor.runtime.accelerometer),
        ("gyroscope", &reactor.runtime.gyroscope),
    ] {
        tracing::info!(
            "{}: {} samples, avg dt {:.4}s (expected {:.4}s), min dt {:.4}s",
            name,
            channel.samples,
            channel.average(),
            1.0 / f64::from(config.default_sample_hz),
            channel.min_delta
        );
    }
    Ok(())
}
