use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle flags of the owning scripting runtime, shared with producer threads.
///
/// Producers read these to decide whether emitting is worthwhile; samples produced
/// while the runtime is paused or destroyed are dropped, never replayed.
#[derive(Debug, Default)]
pub struct RuntimeStatus {
    alive: AtomicBool,
    running: AtomicBool,
}

impl RuntimeStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.alive.store(true, Ordering::Release);
        self.running.store(true, Ordering::Release);
    }

    pub fn pause(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn resume(&self) {
        if self.is_alive() {
            self.running.store(true, Ordering::Release);
        }
    }

    pub fn destroy(&self) {
        self.running.store(false, Ordering::Release);
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Alive and not paused.
    pub fn is_running(&self) -> bool {
        self.is_alive() && self.running.load(Ordering::Acquire)
    }
}
