//! Error types for the sampler.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to callers of [`Sampler`](crate::Sampler).
///
/// Only API misuse and construction-time configuration problems end up here.
/// Failures while reading the load file are absorbed by the sampler and
/// recorded as zero-valued samples instead.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// The sampler was configured with unusable settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `start()` was called while a sampling loop is active.
    #[error("Monitoring is already running")]
    AlreadyRunning,

    /// `stop()` was called without an active sampling loop.
    #[error("Monitoring is not running")]
    NotRunning,

    /// The operating system refused to spawn the sampling thread.
    #[error("Failed to spawn sampling thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A single failed read of a utilization source.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be opened or read.
    #[error("Read error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content was not an integer.
    #[error("Parse error for {content:?}: {source}")]
    Parse {
        content: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// The content was an integer outside 0..=1000.
    #[error("Load value {0} outside 0..=1000")]
    OutOfRange(i64),

    /// A caller-provided source failed for its own reasons.
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Convenience alias for sampler results.
pub type Result<T> = std::result::Result<T, SamplerError>;
