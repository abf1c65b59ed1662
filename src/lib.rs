//! # loadwatch
//!
//! High-frequency sampler for device load pseudo-files such as the Jetson GPU
//! devfreq `load` file.
//!
//! A [`Sampler`] reads one integer (0..=1000, tenths of a percent) from its
//! source every interval on a background thread, timestamps it relative to
//! the session start, and buffers it in memory. Callers can read the buffer,
//! compute statistics, or take a one-off reading at any time, from any
//! thread.
//!
//! ## Architecture
//!
//! ```text
//!  caller threads                     sampling thread
//!  ──────────────                     ───────────────
//!  start() / stop() ──▶ Sampler ──spawns/joins──▶ loop {
//!  data() / stats() ◀── SessionState ◀── push ──    read source
//!  current_utilization() ──▶ UtilizationSource ◀──  sleep(interval)
//!                                                 }
//! ```
//!
//! - **[`source`]**: the [`UtilizationSource`] trait and the sysfs-backed
//!   [`SysfsSource`]
//! - **[`sampler`]**: session lifecycle and the sampling loop
//! - **[`state`]**: the lock-guarded sample buffer and loop status
//! - **[`sample`]**: [`Sample`] and [`Stats`]
//! - **[`config`]** / **[`report`]**: configuration loading and JSON export
//!
//! ## Usage
//!
//! ```rust,no_run
//! use loadwatch::Sampler;
//! use std::time::Duration;
//!
//! let sampler = Sampler::new("/sys/class/devfreq/17000000.gpu/device/load", 0.01)?;
//! println!("now: {}", sampler.current_utilization());
//!
//! sampler.start()?;
//! std::thread::sleep(Duration::from_millis(500));
//! sampler.stop()?;
//!
//! let stats = sampler.stats();
//! println!(
//!     "mean {:.1} max {} stddev {:.1} over {} samples",
//!     stats.mean, stats.max, stats.stddev, stats.count
//! );
//! # Ok::<(), loadwatch::SamplerError>(())
//! ```
//!
//! Read failures never surface as errors: they are logged through `tracing`
//! and recorded as zero-valued samples. The library does not install a
//! subscriber; that is left to the application.

pub mod config;
pub mod error;
pub mod report;
pub mod sample;
pub mod sampler;
pub mod source;
pub mod state;

pub use config::SamplerConfig;
pub use error::{ReadError, SamplerError};
pub use report::Report;
pub use sample::{Sample, Stats};
pub use sampler::{Sampler, SamplerBuilder, DEFAULT_INTERVAL_SECS};
pub use source::{parse_load, SysfsSource, UtilizationSource, DEFAULT_LOAD_PATH, MAX_LOAD};
pub use state::SamplerStatus;
