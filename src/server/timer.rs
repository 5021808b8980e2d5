use std::sync::atomic::{AtomicU64, Ordering};

pub trait Timer {
    fn timestamp(&self) -> u64;
}

pub trait SetableTimer {
    fn add_second(&self);
}

/// Seconds since server start, advanced once per second by the accept
/// loop. TTL deadlines are absolute values of this clock, so they are
/// monotonic regardless of wall-clock adjustments.
pub struct SystemTimer {
    seconds: AtomicU64,
}

impl SystemTimer {
    pub fn new() -> Self {
        debug!("Creating system timer");
        SystemTimer {
            seconds: AtomicU64::new(0),
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn timestamp(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }
}

impl SetableTimer for SystemTimer {
    fn add_second(&self) {
        self.seconds.fetch_add(1, Ordering::SeqCst);
    }
}
