//! Forecasting models for weekly sales series
//!
//! Each model tier implements [`ForecastModel`]; training yields a
//! [`TrainedForecastModel`] that can project the series forward. Models
//! only ever see plain values (the non-zero weeks, oldest first).

use crate::error::{FitError, FitResult};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub mod arima;
pub mod baseline;
pub mod seasonal;

pub use arima::ArimaModel;
pub use baseline::LinearBaseline;
pub use seasonal::HarmonicRegression;

/// Model-selection fallback level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Seasonal,
    Trend,
    Baseline,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::Seasonal => write!(f, "seasonal"),
            ModelTier::Trend => write!(f, "trend"),
            ModelTier::Baseline => write!(f, "baseline"),
        }
    }
}

/// Deadline shared with a running fit so it can stop early
#[derive(Debug, Clone, Copy)]
pub struct FitContext {
    deadline: Option<Instant>,
}

impl FitContext {
    /// No deadline at all
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// Deadline `budget` from now
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + budget),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Bail out of a fit once the deadline has passed
    pub fn check(&self) -> FitResult<()> {
        if self.is_expired() {
            Err(FitError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

/// Point forecasts with their prediction intervals
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    values: Vec<f64>,
    intervals: Vec<(f64, f64)>,
}

impl ModelForecast {
    /// Build a forecast from point values and symmetric interval half-widths.
    ///
    /// Sales cannot be negative, so every bound is floored at zero, which
    /// keeps `lower <= point <= upper`.
    pub fn from_half_widths(points: Vec<f64>, half_widths: &[f64]) -> FitResult<Self> {
        if points.len() != half_widths.len() {
            return Err(FitError::NonConvergence(format!(
                "points length ({}) doesn't match intervals length ({})",
                points.len(),
                half_widths.len()
            )));
        }
        if points.iter().chain(half_widths).any(|v| !v.is_finite()) {
            return Err(FitError::NonConvergence(
                "forecast produced non-finite values".to_string(),
            ));
        }

        let intervals = points
            .iter()
            .zip(half_widths)
            .map(|(p, w)| ((p - w.abs()).max(0.0), (p + w.abs()).max(0.0)))
            .collect();
        let values = points.into_iter().map(|p| p.max(0.0)).collect();

        Ok(Self { values, intervals })
    }

    /// Constant forecast with zero-width intervals
    pub fn flat(value: f64, horizon: usize) -> Self {
        let value = value.max(0.0);
        Self {
            values: vec![value; horizon],
            intervals: vec![(value, value); horizon],
        }
    }

    /// Forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Lower and upper bound per step
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.values.len()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug + Send {
    /// Generate forecast for future periods
    fn forecast(&self, horizon: usize) -> FitResult<ModelForecast>;

    /// Human-readable model description
    fn name(&self) -> String;
}

/// Forecast model that can be trained on a weekly value series
pub trait ForecastModel: Debug + Send + Sync {
    /// Which fallback level this model serves
    fn tier(&self) -> ModelTier;

    /// Train the model, checking `ctx` for the deadline along the way
    fn train(&self, values: &[f64], ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// The models used for each tier.
///
/// The seasonal and trend slots can be swapped for other implementations;
/// the baseline is fixed because it is the fallback that cannot fail.
#[derive(Debug, Clone)]
pub struct TierModels {
    pub seasonal: Arc<dyn ForecastModel>,
    pub trend: Arc<dyn ForecastModel>,
    pub baseline: LinearBaseline,
}

impl TierModels {
    pub fn from_config(config: &crate::config::SelectionConfig) -> Self {
        Self {
            seasonal: Arc::new(HarmonicRegression::new(
                config.seasonal_period,
                config.fourier_order,
                config.interval_level,
            )),
            trend: Arc::new(ArimaModel::new(config.max_ar_order, config.interval_level)),
            baseline: LinearBaseline::new(config.baseline_band),
        }
    }

    pub fn with_seasonal(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.seasonal = model;
        self
    }

    pub fn with_trend(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.trend = model;
        self
    }
}

impl Default for TierModels {
    fn default() -> Self {
        Self::from_config(&crate::config::SelectionConfig::default())
    }
}

/// Two-sided standard normal quantile for an interval level (0.85 -> ~1.44)
pub(crate) fn z_for_level(level: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(0.5 + level.clamp(0.0, 0.999) / 2.0),
        Err(_) => 1.44,
    }
}

/// Reject input the statistical models cannot work with
pub(crate) fn ensure_finite(values: &[f64]) -> FitResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonConvergence(
            "series contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
