//! Confidence labelling from backtest accuracy

use crate::config::ConfidenceConfig;
use crate::metrics::ForecastAccuracy;
use crate::utils::round_to;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative trust in a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
            Confidence::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

impl Confidence {
    /// Label a forecast from its backtest MAPE.
    ///
    /// Without a MAPE the label is LOW, or UNKNOWN when the series is too
    /// short to say anything.
    pub fn classify(mape: Option<f64>, non_zero_weeks: usize, config: &ConfidenceConfig) -> Self {
        match mape {
            Some(mape) if mape < config.high_mape => Confidence::High,
            Some(mape) if mape < config.medium_mape => Confidence::Medium,
            Some(_) => Confidence::Low,
            None if non_zero_weeks < config.min_weeks_for_label => Confidence::Unknown,
            None => Confidence::Low,
        }
    }
}

/// Accuracy block reported with every forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean absolute percentage error, 2 decimals
    pub mape: Option<f64>,
    /// Root mean squared error, 2 decimals
    pub rmse: Option<f64>,
    /// Coefficient of determination, 3 decimals
    pub r2: Option<f64>,
    /// `max(0, 100 - mape)`, 0 when there is no MAPE
    pub accuracy: f64,
    pub confidence: Confidence,
}

impl AccuracyMetrics {
    /// Round the backtest metrics and derive the confidence label.
    ///
    /// The label is computed on the rounded MAPE so the reported number and
    /// the label always agree.
    pub fn from_backtest(
        backtest: Option<&ForecastAccuracy>,
        non_zero_weeks: usize,
        config: &ConfidenceConfig,
    ) -> Self {
        let mape = backtest.and_then(|b| b.mape).map(|m| round_to(m, 2));
        let rmse = backtest.map(|b| round_to(b.rmse, 2));
        let r2 = backtest.map(|b| round_to(b.r_squared, 3));
        let accuracy = mape.map_or(0.0, |m| round_to((100.0 - m).max(0.0), 2));

        Self {
            mape,
            rmse,
            r2,
            accuracy,
            confidence: Confidence::classify(mape, non_zero_weeks, config),
        }
    }

    /// True when a backtest could be run
    pub fn has_metrics(&self) -> bool {
        self.mape.is_some()
    }
}
