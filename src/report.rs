//! Session reports for export.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sample::{Sample, Stats};
use crate::sampler::Sampler;

/// Summary of one sampling session: aggregate statistics plus raw samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Description of the source that was sampled.
    pub source: String,
    pub interval_secs: f64,
    pub stats: Stats,
    pub samples: Vec<Sample>,
}

impl Report {
    /// Build a report from one consistent snapshot of the sampler's buffer.
    pub fn from_sampler(sampler: &Sampler) -> Self {
        let samples = sampler.data();
        Self {
            source: sampler.source().to_string(),
            interval_secs: sampler.interval().as_secs_f64(),
            stats: Stats::from_samples(&samples),
            samples,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))
    }

    /// Read a report previously written with [`write_json`](Report::write_json).
    pub fn read_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("Invalid report JSON")
    }
}
