mod common;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use common::{assert_close, RecordingRuntime, Rig};
use sensorlink::kernel::dispatcher::{DrainReport, TaskDispatcher};
use sensorlink::kernel::event::{RuntimeEvent, ScriptRuntime};
use sensorlink::kernel::reactor::{Reactor, ReactorConfig};
use sensorlink::kernel::runtime::RuntimeStatus;
use sensorlink::sensor::hardware::NaturalOrientation;
use sensorlink::sensor::kind::{SensorKind, SensorType};
use sensorlink::sensor::sampler::SensorSampler;

fn reactor() -> Reactor<RecordingRuntime> {
    let status = Arc::new(RuntimeStatus::new());
    status.start();
    Reactor::new(
        RecordingRuntime::default(),
        Arc::new(TaskDispatcher::new()),
        status,
        ReactorConfig { tick_ms: 5 },
    )
}

#[test]
fn tick_step_advances_frame_and_drains_once() {
    let mut reactor = reactor();
    let frames = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..2 {
        let frames = Arc::clone(&frames);
        reactor.dispatcher.send_fn(move |ctx| {
            frames.lock().push(ctx.tick.frame);
            Ok(())
        });
    }

    assert_eq!(reactor.tick_step(), DrainReport { executed: 2, failed: 0 });
    assert_eq!(reactor.tick.frame, 1);
    assert_eq!(reactor.tick_step(), DrainReport::default());
    assert_eq!(reactor.tick.frame, 2);
    assert_eq!(*frames.lock(), vec![1, 1]);
}

#[test]
fn teardown_discards_queue_and_kills_runtime() {
    let mut reactor = reactor();
    reactor.dispatcher.send_fn(|_| Ok(()));
    reactor.dispatcher.send_fn(|_| Ok(()));

    reactor.teardown();
    assert_eq!(reactor.dispatcher.pending(), 0);
    assert!(!reactor.status.is_alive());
    assert!(!reactor.status.is_running());

    // A dead runtime cannot be resumed.
    reactor.status.resume();
    assert!(!reactor.status.is_running());
}

#[test]
fn sampler_to_runtime_end_to_end() {
    let rig = Rig::new();
    let sampler = SensorSampler::new(
        SensorKind::ACCELEROMETER,
        rig.host(NaturalOrientation::Portrait),
    );
    let mut reactor = Reactor::new(
        RecordingRuntime::default(),
        Arc::clone(&rig.dispatcher),
        Arc::clone(&rig.status),
        ReactorConfig::default(),
    );

    sampler.start().unwrap();
    let ms = 1_000_000;
    for (i, ts) in [0, 10, 110, 210, 310].into_iter().enumerate() {
        rig.service
            .push(SensorType::Accelerometer, ts * ms, [i as f32, 0.0, 0.0]);
        if i > 0 {
            rig.timer.fire();
        }
    }

    assert_eq!(reactor.tick_step().executed, 3);
    let xs: Vec<f64> = reactor
        .runtime
        .events
        .iter()
        .map(|e| match e {
            RuntimeEvent::Accelerometer(s) => {
                assert_close(s.delta_time, 0.1);
                s.x
            }
            RuntimeEvent::Gyroscope(_) => panic!("wrong channel"),
        })
        .collect();
    assert_eq!(xs.len(), 3);
    assert_close(xs[0], -0.2);
    assert_close(xs[2], -0.4);
}

#[tokio::test]
async fn run_processes_work_until_shutdown() {
    let mut reactor = reactor();
    let dispatcher = Arc::clone(&reactor.dispatcher);
    let shutdown = CancellationToken::new();

    let producer_shutdown = shutdown.clone();
    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        for _ in 0..3 {
            dispatcher.send_fn(|ctx| {
                ctx.runtime.dispatch(RuntimeEvent::Gyroscope(Default::default()))
            });
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Left queued at shutdown; teardown discards it.
        dispatcher.send_fn(|_| Ok(()));
        producer_shutdown.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), reactor.run(shutdown))
        .await
        .expect("reactor did not stop");
    producer.await.unwrap();

    assert_eq!(reactor.runtime.events.len(), 3);
    assert!(reactor.tick.frame >= 1);
    assert_eq!(reactor.dispatcher.pending(), 0);
    assert!(!reactor.status.is_alive());
}

#[tokio::test]
async fn idle_reactor_stops_promptly() {
    let mut reactor = reactor();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_millis(500), reactor.run(shutdown))
        .await
        .expect("reactor did not stop");
    assert_eq!(reactor.tick.frame, 0);
}
