use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::dispatcher::{DrainReport, TaskDispatcher};
use super::event::{ScriptRuntime, TaskContext};
use super::runtime::RuntimeStatus;
use super::time::{Tick, TICK_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactorConfig {
    pub tick_ms: u64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self { tick_ms: TICK_MS }
    }
}

/// The single consumer: owns the scripting runtime and drains the dispatcher
/// once per tick.
pub struct Reactor<R: ScriptRuntime> {
    pub dispatcher: Arc<TaskDispatcher>,
    pub status: Arc<RuntimeStatus>,
    pub runtime: R,
    pub tick: Tick,
    config: ReactorConfig,
}

impl<R: ScriptRuntime> Reactor<R> {
    pub fn new(
        runtime: R,
        dispatcher: Arc<TaskDispatcher>,
        status: Arc<RuntimeStatus>,
        config: ReactorConfig,
    ) -> Self {
        Self {
            dispatcher,
            status,
            runtime,
            tick: Tick::new(),
            config,
        }
    }

    /// One consumer tick: advance the frame counter, then drain exactly once.
    /// Does not await; tasks queued while draining wait for the next step.
    pub fn tick_step(&mut self) -> DrainReport {
        self.tick = self.tick.next();
        let mut ctx = TaskContext::new(&mut self.runtime, self.tick);
        self.dispatcher.drain_and_execute_all(&mut ctx)
    }

    /// Async driver loop. Idles until the dispatcher signals pending work, then
    /// ticks on the configured cadence. Returns after `shutdown` fires, having
    /// torn down the queue.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!("Reactor Pipeline Started. Tick: {}ms", self.config.tick_ms);

        let wake = self.dispatcher.wake_handle();
        let mut cadence = interval(Duration::from_millis(self.config.tick_ms.max(1)));
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.dispatcher.pending() == 0 {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = wake.notified() => {}
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = cadence.tick() => {
                    self.tick_step();
                }
            }
        }

        self.teardown();
    }

    /// Marks the runtime dead and discards whatever is still queued.
    pub fn teardown(&mut self) {
        self.status.destroy();
        let discarded = self.dispatcher.remove_all();
        info!(
            "Reactor stopped at tick {}. Discarded {} pending task(s)",
            self.tick.frame, discarded
        );
    }
}
