//! Cooperative cancellation shared by every pipeline worker.

use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Cloneable stop token, checked once per worker loop iteration.
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Waits up to `grace` for a worker to exit, then abandons it.
///
/// A worker parked in a device read past the timeout is left to the
/// process teardown; it is never forcibly terminated.
pub fn join_timeout(handle: JoinHandle<()>, grace: Duration, name: &str) {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    if handle.is_finished() {
        let _ = handle.join();
    } else {
        warn!("[{}] worker did not stop within {:?}, abandoning", name, grace);
    }
}
