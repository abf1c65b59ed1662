//! Sampler configuration.
//!
//! Settings come from an optional TOML file, then `LOADWATCH_*` environment
//! variables, with later sources overriding earlier ones:
//!
//! ```toml
//! source_path = "/sys/class/devfreq/17000000.gpu/device/load"
//! interval_secs = 0.01
//! ```
//!
//! ```bash
//! LOADWATCH_INTERVAL_SECS=0.005 loadwatch
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::sampler::DEFAULT_INTERVAL_SECS;
use crate::source::DEFAULT_LOAD_PATH;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "LOADWATCH";

/// Where to read from and how often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Path of the load pseudo-file.
    pub source_path: PathBuf,
    /// Sampling interval in seconds.
    pub interval_secs: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_LOAD_PATH),
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl SamplerConfig {
    /// Load configuration from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Like [`load`](SamplerConfig::load) with a custom environment prefix.
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()
            .with_context(|| match path {
                Some(p) => format!("Failed to load config from {}", p.display()),
                None => "Failed to load config from environment".to_string(),
            })?;

        config
            .try_deserialize()
            .context("Invalid sampler configuration")
    }
}
