//! Sample and statistics types.

use serde::{Deserialize, Serialize};

/// One reading taken during a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the session started.
    pub elapsed_secs: f64,
    /// Utilization in tenths of a percent (0..=1000).
    pub value: u16,
}

impl Sample {
    pub fn new(elapsed_secs: f64, value: u16) -> Self {
        Self {
            elapsed_secs,
            value,
        }
    }

    /// Utilization as a percentage (0.0..=100.0).
    pub fn percent(&self) -> f64 {
        f64::from(self.value) / 10.0
    }
}

/// Aggregate statistics over a sample sequence.
///
/// All fields are zero for an empty sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Arithmetic mean of the values.
    pub mean: f64,
    /// Largest value.
    pub max: u16,
    /// Sample standard deviation (n - 1 denominator), zero below two samples.
    pub stddev: f64,
    /// Number of samples.
    pub count: usize,
}

impl Stats {
    /// Compute statistics over `samples`.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let count = samples.len();
        if count == 0 {
            return Self::default();
        }

        let sum: f64 = samples.iter().map(|s| f64::from(s.value)).sum();
        let mean = sum / count as f64;
        let max = samples.iter().map(|s| s.value).max().unwrap_or(0);

        let stddev = if count > 1 {
            let squares: f64 = samples
                .iter()
                .map(|s| {
                    let d = f64::from(s.value) - mean;
                    d * d
                })
                .sum();
            (squares / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        Self {
            mean,
            max,
            stddev,
            count,
        }
    }

    /// Mean as a percentage.
    pub fn mean_percent(&self) -> f64 {
        self.mean / 10.0
    }

    /// Max as a percentage.
    pub fn max_percent(&self) -> f64 {
        f64::from(self.max) / 10.0
    }
}
