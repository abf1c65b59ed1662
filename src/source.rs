//! Utilization source abstraction.
//!
//! A source yields one utilization reading per call. The production source
//! reads a sysfs pseudo-file; tests plug in their own implementations to
//! inject failures without touching the filesystem.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReadError;

/// GPU devfreq load file on Jetson boards.
pub const DEFAULT_LOAD_PATH: &str = "/sys/class/devfreq/17000000.gpu/device/load";

/// Upper bound of a load reading, in tenths of a percent.
pub const MAX_LOAD: u16 = 1000;

/// Trait for reading one utilization value.
///
/// Implementations must be cheap to call repeatedly and safe to call from
/// several threads at once: the sampling loop and
/// [`Sampler::current_utilization`](crate::Sampler::current_utilization)
/// read the same source concurrently.
///
/// # Example
///
/// ```
/// use loadwatch::{SysfsSource, UtilizationSource};
///
/// let source = SysfsSource::new("/nonexistent/load");
/// assert!(source.read().is_err());
/// assert_eq!(source.description(), "sysfs: /nonexistent/load");
/// ```
pub trait UtilizationSource: Send + Sync + Debug {
    /// Read the current utilization in tenths of a percent (0..=1000).
    fn read(&self) -> Result<u16, ReadError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// Whether the source looks usable right now.
    ///
    /// Only used for the construction-time warning, so the default is
    /// optimistic.
    fn is_available(&self) -> bool {
        true
    }
}

/// A source that reads a single integer from a sysfs pseudo-file.
#[derive(Debug, Clone)]
pub struct SysfsSource {
    path: PathBuf,
    description: String,
}

impl SysfsSource {
    /// Create a new sysfs source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("sysfs: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for SysfsSource {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_PATH)
    }
}

impl UtilizationSource for SysfsSource {
    fn read(&self) -> Result<u16, ReadError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ReadError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_load(&content)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }
}

/// Parse the content of a load file.
///
/// Surrounding whitespace is ignored. Anything that is not an integer in
/// `0..=1000` is rejected.
pub fn parse_load(content: &str) -> Result<u16, ReadError> {
    let trimmed = content.trim();
    let value: i64 = trimmed.parse().map_err(|source| ReadError::Parse {
        content: trimmed.to_string(),
        source,
    })?;

    if (0..=i64::from(MAX_LOAD)).contains(&value) {
        Ok(value as u16)
    } else {
        Err(ReadError::OutOfRange(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_plain_value() {
        assert_eq!(parse_load("500").unwrap(), 500);
    }

    #[test]
    fn parse_ignores_surrounding_whitespace() {
        assert_eq!(parse_load("  42\n").unwrap(), 42);
        assert_eq!(parse_load("\t1000 \n").unwrap(), 1000);
    }

    #[test]
    fn parse_accepts_bounds() {
        assert_eq!(parse_load("0").unwrap(), 0);
        assert_eq!(parse_load("1000").unwrap(), MAX_LOAD);
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert!(matches!(parse_load("1001"), Err(ReadError::OutOfRange(1001))));
        assert!(matches!(parse_load("-1"), Err(ReadError::OutOfRange(-1))));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(parse_load("busy"), Err(ReadError::Parse { .. })));
        assert!(matches!(parse_load(""), Err(ReadError::Parse { .. })));
        assert!(matches!(parse_load("12.5"), Err(ReadError::Parse { .. })));
    }

    #[test]
    fn sysfs_source_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "737").unwrap();

        let source = SysfsSource::new(file.path());
        assert!(source.is_available());
        assert_eq!(source.read().unwrap(), 737);
    }

    #[test]
    fn sysfs_source_missing_file() {
        let source = SysfsSource::new("/nonexistent/path/load");

        assert!(!source.is_available());
        let err = source.read().unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
        assert!(err.to_string().contains("Read error"));
    }

    #[test]
    fn default_source_points_at_gpu_load() {
        let source = SysfsSource::default();
        assert_eq!(source.path(), Path::new(DEFAULT_LOAD_PATH));
    }
}
