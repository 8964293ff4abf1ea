use serde::{Deserialize, Serialize};

use super::time::Tick;

/// One fixed-interval motion reading, already normalized to the portrait frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Seconds elapsed since the previous emitted sample.
    pub delta_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionChannel {
    Accelerometer,
    Gyroscope,
}

/// Events consumed by the embedded scripting runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuntimeEvent {
    Accelerometer(MotionSample),
    Gyroscope(MotionSample),
}

impl RuntimeEvent {
    pub fn motion(channel: MotionChannel, sample: MotionSample) -> Self {
        match channel {
            MotionChannel::Accelerometer => RuntimeEvent::Accelerometer(sample),
            MotionChannel::Gyroscope => RuntimeEvent::Gyroscope(sample),
        }
    }
}

/// The embedded scripting runtime as seen from the dispatcher.
/// Lives on the consumer thread; tasks reach it only through a [`TaskContext`].
pub trait ScriptRuntime {
    fn dispatch(&mut self, event: RuntimeEvent) -> anyhow::Result<()>;
}

/// Everything a task may touch while executing. Passed explicitly, never global.
pub struct TaskContext<'a> {
    pub runtime: &'a mut dyn ScriptRuntime,
    pub tick: Tick,
}

impl<'a> TaskContext<'a> {
    pub fn new(runtime: &'a mut dyn ScriptRuntime, tick: Tick) -> Self {
        Self { runtime, tick }
    }
}

/// A unit of work queued by any producer thread and executed once by the consumer tick.
pub trait Task: Send {
    fn execute(self: Box<Self>, ctx: &mut TaskContext<'_>) -> anyhow::Result<()>;
}

impl<F> Task for F
where
    F: FnOnce(&mut TaskContext<'_>) -> anyhow::Result<()> + Send,
{
    fn execute(self: Box<Self>, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        (*self)(ctx)
    }
}

/// Delivers one resampled sensor reading to the runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTask {
    pub channel: MotionChannel,
    pub sample: MotionSample,
}

impl Task for MotionTask {
    fn execute(self: Box<Self>, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        ctx.runtime.dispatch(RuntimeEvent::motion(self.channel, self.sample))
    }
}
