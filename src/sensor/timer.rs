use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// A running periodic timer. Dropping it disarms it as well.
pub trait ArmedTimer: Send {
    /// Prevents future callbacks. A callback already running is not interrupted.
    fn disarm(&mut self);
}

/// Platform periodic-timer primitive.
pub trait TimerDriver: Send + Sync {
    fn arm(&self, period: Duration, callback: TimerCallback) -> Box<dyn ArmedTimer>;
}

/// Fixed-period timer backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: Handle,
}

impl TokioTimer {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running in, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl TimerDriver for TokioTimer {
    fn arm(&self, period: Duration, callback: TimerCallback) -> Box<dyn ArmedTimer> {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = period.max(Duration::from_millis(1));

        self.handle.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; the first callback is one period out.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => callback(),
                }
            }
            debug!("Timer ({:?}) disarmed", period);
        });

        Box::new(TokioArmedTimer { token })
    }
}

struct TokioArmedTimer {
    token: CancellationToken,
}

impl ArmedTimer for TokioArmedTimer {
    fn disarm(&mut self) {
        self.token.cancel();
    }
}

impl Drop for TokioArmedTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
