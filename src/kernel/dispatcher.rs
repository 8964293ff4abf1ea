use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, error};

use super::event::{Task, TaskContext};

/// Outcome of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub executed: usize,
    pub failed: usize,
}

/// Multi-producer task queue drained by a single consumer tick.
///
/// The lock is held only to append and to snapshot-and-clear; tasks always run
/// outside it, so a task that sends more work lands in the next drain.
pub struct TaskDispatcher {
    queue: Mutex<Vec<Box<dyn Task>>>,
    wake: Arc<Notify>,
}

impl TaskDispatcher {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Queues a task. Never executes it synchronously, even from the consumer thread.
    pub fn send(&self, task: Box<dyn Task>) {
        self.queue.lock().push(task);
        // Consumer may be parked between ticks.
        self.wake.notify_one();
    }

    /// Convenience for closure tasks.
    pub fn send_fn<F>(&self, f: F)
    where
        F: FnOnce(&mut TaskContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        self.send(Box::new(f));
    }

    /// Number of queued, not yet executed tasks.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Handle the consumer awaits to learn that work is pending.
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Takes everything queued so far and runs it in FIFO order.
    ///
    /// A failing or panicking task is logged and counted; the rest of the batch still runs.
    pub fn drain_and_execute_all(&self, ctx: &mut TaskContext<'_>) -> DrainReport {
        let batch = std::mem::take(&mut *self.queue.lock());
        let mut report = DrainReport::default();

        for task in batch {
            report.executed += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| task.execute(ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    error!("Task failed at tick {}: {:#}", ctx.tick.frame, e);
                }
                Err(payload) => {
                    report.failed += 1;
                    error!(
                        "Task panicked at tick {}: {}",
                        ctx.tick.frame,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        if report.executed > 0 {
            debug!("Drained {} task(s), {} failed", report.executed, report.failed);
        }
        report
    }

    /// Discards pending tasks (teardown). A task already executing is unaffected.
    pub fn remove_all(&self) -> usize {
        let mut queue = self.queue.lock();
        let discarded = queue.len();
        queue.clear();
        discarded
    }
}

impl Default for TaskDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDispatcher")
            .field("pending", &self.pending())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
