//! The Sampler: background sampling loop plus live and aggregate accessors.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::config::SamplerConfig;
use crate::error::{Result, SamplerError};
use crate::sample::{Sample, Stats};
use crate::source::{SysfsSource, UtilizationSource, DEFAULT_LOAD_PATH};
use crate::state::{SamplerStatus, SessionState};

/// Default sampling interval in seconds (100 Hz).
pub const DEFAULT_INTERVAL_SECS: f64 = 0.01;

const THREAD_NAME: &str = "loadwatch-sampler";

/// Samples a utilization source on a background thread.
///
/// Each call to [`start`](Sampler::start) begins a new session: the buffer is
/// emptied, the session clock restarts, and a thread appends one
/// [`Sample`] per interval until [`stop`](Sampler::stop) is called. Reads that
/// fail are logged and recorded as zero-valued samples, so the cadence is
/// never broken by a flaky source.
///
/// All methods take `&self`; wrap the sampler in an `Arc` to share it between
/// threads.
///
/// # Example
///
/// ```rust,no_run
/// use loadwatch::Sampler;
/// use std::time::Duration;
///
/// let sampler = Sampler::builder().interval_secs(0.01).build()?;
///
/// sampler.start()?;
/// std::thread::sleep(Duration::from_secs(1));
/// sampler.stop()?;
///
/// let stats = sampler.stats();
/// println!("mean {:.1}% over {} samples", stats.mean_percent(), stats.count);
/// # Ok::<(), loadwatch::SamplerError>(())
/// ```
#[derive(Debug)]
pub struct Sampler {
    source: Arc<dyn UtilizationSource>,
    interval: Duration,
    state: Arc<SessionState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Sampler {
    /// Create a sampler reading `path` every `interval_secs` seconds.
    ///
    /// Fails with [`SamplerError::InvalidConfiguration`] when the interval is
    /// not a positive, finite number of seconds. A missing file only produces
    /// a warning: sampling may still be attempted and will record zeros.
    pub fn new<P: AsRef<Path>>(path: P, interval_secs: f64) -> Result<Self> {
        Self::with_source(Arc::new(SysfsSource::new(path)), interval_secs)
    }

    /// Create a sampler over any [`UtilizationSource`].
    pub fn with_source(source: Arc<dyn UtilizationSource>, interval_secs: f64) -> Result<Self> {
        let interval = validate_interval(interval_secs)?;

        if !source.is_available() {
            warn!(
                source = source.description(),
                "Load source not found. Monitoring will fail."
            );
        }

        Ok(Self {
            source,
            interval,
            state: Arc::new(SessionState::default()),
            worker: Mutex::new(None),
        })
    }

    /// Create a sampler from loaded configuration.
    pub fn from_config(config: &SamplerConfig) -> Result<Self> {
        Self::new(&config.source_path, config.interval_secs)
    }

    /// Create a builder for configuring the sampler.
    pub fn builder() -> SamplerBuilder {
        SamplerBuilder::new()
    }

    /// Begin a new sampling session.
    ///
    /// Returns as soon as the thread is spawned; the first sample arrives
    /// asynchronously. Fails with [`SamplerError::AlreadyRunning`] if a
    /// session is active, leaving that session untouched.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();

        if self.state.status() == SamplerStatus::Running {
            return Err(SamplerError::AlreadyRunning);
        }

        // A previous loop has already finished (stopped or crashed).
        if let Some(previous) = worker.take() {
            let _ = previous.join();
        }

        let previous_status = self.state.status();
        self.state.reset();
        self.state.set_status(SamplerStatus::Running);

        let source = self.source.clone();
        let state = self.state.clone();
        let interval = self.interval;

        let spawned = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_session(source, state, interval));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                debug!(
                    source = self.source.description(),
                    "Started sampling at {:.1} Hz",
                    1.0 / self.interval.as_secs_f64()
                );
                Ok(())
            }
            Err(e) => {
                self.state.set_status(previous_status);
                Err(SamplerError::Spawn(e))
            }
        }
    }

    /// End the current session and wait for the sampling thread to exit.
    ///
    /// Blocks for at most about one interval plus one read. Fails with
    /// [`SamplerError::NotRunning`] if no session is active.
    pub fn stop(&self) -> Result<()> {
        let mut worker = self.worker.lock();

        if self.state.status() != SamplerStatus::Running {
            // Reap a loop that ended on its own.
            if let Some(finished) = worker.take() {
                let _ = finished.join();
            }
            return Err(SamplerError::NotRunning);
        }

        self.state.request_stop();
        if let Some(handle) = worker.take() {
            let _ = handle.join();
        }
        debug!(source = self.source.description(), "Stopped sampling");
        Ok(())
    }

    /// Read the source once, independently of any running session.
    ///
    /// Returns 0 if the read fails; the failure is logged, not raised.
    pub fn current_utilization(&self) -> u16 {
        match self.source.read() {
            Ok(value) => value,
            Err(e) => {
                error!(
                    source = self.source.description(),
                    error = %e,
                    "Error reading current utilization"
                );
                0
            }
        }
    }

    /// Statistics over a snapshot of the current buffer.
    pub fn stats(&self) -> Stats {
        Stats::from_samples(&self.state.snapshot())
    }

    /// Copy of the samples recorded in the current or last session.
    pub fn data(&self) -> Vec<Sample> {
        self.state.snapshot()
    }

    /// Number of samples recorded so far.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Whether no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a sampling loop is currently active.
    pub fn is_running(&self) -> bool {
        self.state.status() == SamplerStatus::Running
    }

    /// Lifecycle status, including whether the last loop crashed.
    pub fn status(&self) -> SamplerStatus {
        self.state.status()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Description of the underlying source.
    pub fn source(&self) -> &str {
        self.source.description()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        // Detach rather than join: the thread exits after its current cycle.
        if self.worker.get_mut().take().is_some() {
            self.state.request_stop();
        }
    }
}

/// Builder for configuring a [`Sampler`].
#[derive(Debug, Default)]
pub struct SamplerBuilder {
    path: Option<PathBuf>,
    source: Option<Arc<dyn UtilizationSource>>,
    interval_secs: Option<f64>,
}

impl SamplerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a sysfs file at `path`.
    ///
    /// Defaults to [`DEFAULT_LOAD_PATH`].
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Use a custom source instead of a sysfs file. Takes precedence over
    /// [`path`](SamplerBuilder::path).
    pub fn source(mut self, source: Arc<dyn UtilizationSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the sampling interval in seconds.
    ///
    /// Defaults to [`DEFAULT_INTERVAL_SECS`].
    pub fn interval_secs(mut self, secs: f64) -> Self {
        self.interval_secs = Some(secs);
        self
    }

    /// Set the sampling interval.
    pub fn interval(self, interval: Duration) -> Self {
        self.interval_secs(interval.as_secs_f64())
    }

    /// Build the sampler.
    pub fn build(self) -> Result<Sampler> {
        let interval_secs = self.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS);
        let source = match self.source {
            Some(source) => source,
            None => Arc::new(SysfsSource::new(
                self.path.unwrap_or_else(|| PathBuf::from(DEFAULT_LOAD_PATH)),
            )),
        };
        Sampler::with_source(source, interval_secs)
    }
}

fn validate_interval(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SamplerError::InvalidConfiguration(format!(
            "interval must be positive, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| SamplerError::InvalidConfiguration(format!("interval {secs}: {e}")))
}

/// Thread body: runs the loop and records how it ended.
fn run_session(source: Arc<dyn UtilizationSource>, state: Arc<SessionState>, interval: Duration) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        sample_loop(source.as_ref(), &state, interval)
    }));

    match outcome {
        Ok(()) => state.set_status(SamplerStatus::Stopped),
        Err(_) => {
            state.set_status(SamplerStatus::Crashed);
            error!(
                source = source.description(),
                "Sampling thread panicked; session ended"
            );
        }
    }
}

fn sample_loop(source: &dyn UtilizationSource, state: &SessionState, interval: Duration) {
    // Failed reads reuse the timestamp of the last good one.
    let mut last_elapsed = 0.0;

    loop {
        match source.read() {
            Ok(value) => {
                let elapsed = state.elapsed_secs();
                state.push(Sample::new(elapsed, value));
                last_elapsed = elapsed;
            }
            Err(e) => {
                error!(
                    source = source.description(),
                    error = %e,
                    "Error in sampling loop"
                );
                state.push(Sample::new(last_elapsed, 0));
            }
        }

        thread::sleep(interval);

        if state.stop_requested() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Returns `value` for the first `good_reads` calls, then fails.
    #[derive(Debug)]
    struct FlakySource {
        value: u16,
        good_reads: usize,
        calls: AtomicUsize,
    }

    impl FlakySource {
        fn new(value: u16, good_reads: usize) -> Self {
            Self {
                value,
                good_reads,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl UtilizationSource for FlakySource {
        fn read(&self) -> std::result::Result<u16, ReadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.good_reads {
                Ok(self.value)
            } else {
                Err(ReadError::Unavailable("injected failure".to_string()))
            }
        }

        fn description(&self) -> &str {
            "flaky"
        }
    }

    #[derive(Debug)]
    struct PanickingSource;

    impl UtilizationSource for PanickingSource {
        fn read(&self) -> std::result::Result<u16, ReadError> {
            panic!("source exploded");
        }

        fn description(&self) -> &str {
            "panicking"
        }
    }

    fn wait_for(sampler: &Sampler, min_len: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sampler.len() < min_len && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn rejects_non_positive_interval() {
        for bad in [0.0, -0.01, -1.0, f64::NAN, f64::INFINITY] {
            let result = Sampler::new("/nonexistent/load", bad);
            assert!(
                matches!(result, Err(SamplerError::InvalidConfiguration(_))),
                "interval {bad} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_positive_intervals_even_without_file() {
        for good in [0.001, 0.01, 0.5, 2.0] {
            let sampler = Sampler::new("/nonexistent/load", good).unwrap();
            assert_eq!(sampler.interval(), Duration::from_secs_f64(good));
            assert!(!sampler.is_running());
            assert_eq!(sampler.status(), SamplerStatus::Idle);
        }
    }

    #[test]
    fn builder_defaults() {
        let sampler = Sampler::builder().build().unwrap();
        assert_eq!(sampler.interval(), Duration::from_secs_f64(DEFAULT_INTERVAL_SECS));
        assert_eq!(sampler.source(), format!("sysfs: {DEFAULT_LOAD_PATH}"));
    }

    #[test]
    fn builder_custom_source_wins_over_path() {
        let sampler = Sampler::builder()
            .path("/tmp/ignored")
            .source(Arc::new(FlakySource::new(1, 1)))
            .interval(Duration::from_millis(5))
            .build()
            .unwrap();
        assert_eq!(sampler.source(), "flaky");
        assert_eq!(sampler.interval(), Duration::from_millis(5));
    }

    #[test]
    fn builder_rejects_zero_interval() {
        let result = Sampler::builder().interval_secs(0.0).build();
        assert!(matches!(result, Err(SamplerError::InvalidConfiguration(_))));
    }

    #[test]
    fn stop_without_start_is_not_running() {
        let sampler = Sampler::new("/nonexistent/load", 0.01).unwrap();
        assert!(matches!(sampler.stop(), Err(SamplerError::NotRunning)));
    }

    #[test]
    fn persistent_failure_records_zero_samples_at_time_zero() {
        let sampler = Sampler::with_source(Arc::new(FlakySource::new(500, 0)), 0.002).unwrap();

        sampler.start().unwrap();
        wait_for(&sampler, 5);
        assert!(sampler.is_running());
        sampler.stop().unwrap();

        let data = sampler.data();
        assert!(data.len() >= 5);
        assert!(data.iter().all(|s| s.value == 0 && s.elapsed_secs == 0.0));
    }

    #[test]
    fn failure_reuses_last_good_timestamp() {
        let sampler = Sampler::with_source(Arc::new(FlakySource::new(420, 3)), 0.002).unwrap();

        sampler.start().unwrap();
        wait_for(&sampler, 6);
        sampler.stop().unwrap();

        let data = sampler.data();
        assert!(data.len() >= 6);
        assert!(data[..3].iter().all(|s| s.value == 420));
        let last_good = data[2].elapsed_secs;
        for s in &data[3..] {
            assert_eq!(s.value, 0);
            assert_eq!(s.elapsed_secs, last_good);
        }
    }

    #[test]
    fn panic_in_loop_is_reported_as_crashed() {
        let sampler = Sampler::with_source(Arc::new(PanickingSource), 0.001).unwrap();

        sampler.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while sampler.status() == SamplerStatus::Running && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }

        assert_eq!(sampler.status(), SamplerStatus::Crashed);
        assert!(!sampler.is_running());
        assert!(matches!(sampler.stop(), Err(SamplerError::NotRunning)));
    }

    #[test]
    fn can_restart_after_crash() {
        let sampler = Sampler::with_source(Arc::new(PanickingSource), 0.001).unwrap();

        sampler.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while sampler.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }

        assert!(sampler.start().is_ok());
    }

    #[test]
    fn current_utilization_degrades_to_zero() {
        let sampler = Sampler::with_source(Arc::new(FlakySource::new(650, 1)), 0.01).unwrap();
        assert_eq!(sampler.current_utilization(), 650);
        assert_eq!(sampler.current_utilization(), 0);
    }

    #[test]
    fn drop_while_running_does_not_block() {
        let sampler = Sampler::with_source(Arc::new(FlakySource::new(1, usize::MAX)), 0.5).unwrap();
        sampler.start().unwrap();

        let started = Instant::now();
        drop(sampler);
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
