//! Shared state between a [`Sampler`](crate::Sampler) and its sampling thread.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::sample::Sample;

/// Lifecycle status of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerStatus {
    /// No session has been started yet.
    Idle,
    /// A sampling loop is active.
    Running,
    /// The last session ended through `stop()`.
    Stopped,
    /// The last session's loop ended by panicking.
    Crashed,
}

impl SamplerStatus {
    fn as_u8(self) -> u8 {
        match self {
            SamplerStatus::Idle => 0,
            SamplerStatus::Running => 1,
            SamplerStatus::Stopped => 2,
            SamplerStatus::Crashed => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SamplerStatus::Running,
            2 => SamplerStatus::Stopped,
            3 => SamplerStatus::Crashed,
            _ => SamplerStatus::Idle,
        }
    }
}

/// Thread-safe state for one sampler.
///
/// The sample buffer is append-only while a session runs and is only ever
/// written by the sampling thread. Readers clone it under the read lock, so
/// they never see a partial append.
#[derive(Debug)]
pub struct SessionState {
    samples: RwLock<Vec<Sample>>,
    started_at: Mutex<Instant>,
    stop: AtomicBool,
    status: AtomicU8,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            samples: RwLock::new(Vec::new()),
            started_at: Mutex::new(Instant::now()),
            stop: AtomicBool::new(false),
            status: AtomicU8::new(SamplerStatus::Idle.as_u8()),
        }
    }
}

impl SessionState {
    /// Prepare for a new session: empty buffer, fresh start instant, stop
    /// flag cleared.
    pub fn reset(&self) {
        self.samples.write().clear();
        *self.started_at.lock() = Instant::now();
        self.stop.store(false, Ordering::SeqCst);
    }

    /// Seconds since the current session started.
    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.lock().elapsed().as_secs_f64()
    }

    pub fn push(&self, sample: Sample) {
        self.samples.write().push(sample);
    }

    /// Copy of the buffered samples.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.read().clone()
    }

    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SamplerStatus {
        SamplerStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn set_status(&self, status: SamplerStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }
}
