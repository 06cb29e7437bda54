//! Outlier detection on weekly totals
//!
//! Flags weeks whose z-score exceeds the configured threshold and produces
//! a capped copy of the values for model fitting. The original series is
//! never modified; reports always show the true totals.

use crate::config::{AnomalyConfig, CapStrategy};
use crate::series::WeeklySeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use series_math::{mean, median, sample_std_dev, z_scores};

/// One week that was treated as an outlier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    /// Position in the weekly series
    pub index: usize,
    pub week_start: NaiveDate,
    /// True weekly total
    pub original: f64,
    /// Value used for fitting instead
    pub capped: f64,
    pub z_score: f64,
}

/// Outcome of anomaly detection over a weekly series
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnomalyReport {
    /// Values parallel to the weekly series, with flagged weeks replaced
    pub capped: Vec<f64>,
    pub flags: Vec<AnomalyFlag>,
}

impl AnomalyReport {
    pub fn flagged_indices(&self) -> Vec<usize> {
        self.flags.iter().map(|f| f.index).collect()
    }

    pub fn has_anomalies(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Z-score based detector over the non-zero weeks of a series
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Scan the series and cap outliers.
    ///
    /// Zero weeks are gaps in trading, not anomalies: they are left out of
    /// the mean and deviation and are never flagged.
    pub fn detect(&self, series: &WeeklySeries) -> AnomalyReport {
        let values = series.values();
        let unflagged = AnomalyReport {
            capped: values.clone(),
            flags: Vec::new(),
        };

        let active: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
        if active.len() < self.config.min_points.max(2) {
            return unflagged;
        }

        let (center, spread) = match (mean(&active), sample_std_dev(&active)) {
            (Ok(center), Ok(spread)) => (center, spread),
            _ => return unflagged,
        };
        let replacement = match self.config.cap_strategy {
            CapStrategy::Median => median(&active).unwrap_or(center),
            CapStrategy::Mean => center,
        };

        let scores = z_scores(&values, center, spread);
        let mut capped = values.clone();
        let mut flags = Vec::new();

        for (index, (point, &z)) in series.points().iter().zip(&scores).enumerate() {
            if point.value == 0.0 || z.abs() <= self.config.zscore_threshold {
                continue;
            }
            capped[index] = replacement;
            flags.push(AnomalyFlag {
                index,
                week_start: point.week_start,
                original: point.value,
                capped: replacement,
                z_score: z,
            });
        }

        AnomalyReport { capped, flags }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}
