//! Harmonic regression for series with a yearly cycle
//!
//! Fits `y_t = a + b * t/n + sum_k (s_k sin(2 pi k t / P) + c_k cos(2 pi k t / P))`
//! jointly by least squares. Fitting trend and harmonics together keeps a
//! single observed cycle from leaking into the slope.

use crate::error::{FitError, FitResult};
use crate::models::{
    ensure_finite, z_for_level, FitContext, ForecastModel, ModelForecast, ModelTier,
    TrainedForecastModel,
};
use series_math::{least_squares, MathError};
use std::f64::consts::PI;

/// Seasonal tier model: linear trend plus Fourier terms
#[derive(Debug, Clone)]
pub struct HarmonicRegression {
    name: String,
    /// Cycle length in weeks
    period: usize,
    /// Number of sine/cosine pairs
    harmonics: usize,
    interval_level: f64,
}

/// Fitted harmonic regression
#[derive(Debug, Clone)]
pub struct TrainedHarmonicRegression {
    coefficients: Vec<f64>,
    period: usize,
    harmonics: usize,
    /// Observations used in training; also the trend scale
    observations: usize,
    residual_std: f64,
    z: f64,
}

impl HarmonicRegression {
    pub fn new(period: usize, harmonics: usize, interval_level: f64) -> Self {
        Self {
            name: format!("Harmonic Regression (P={}, K={})", period, harmonics),
            period,
            harmonics,
            interval_level,
        }
    }

    /// Fewest observations a fit accepts: one full cycle, and enough rows
    /// to leave residual degrees of freedom.
    pub fn min_observations(&self) -> usize {
        self.period.max(2 * self.harmonics + 4)
    }
}

/// Regressors for time index `t`
fn design_row(t: usize, scale: usize, period: usize, harmonics: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + 2 * harmonics);
    row.push(1.0);
    row.push(t as f64 / scale as f64);
    for k in 1..=harmonics {
        let angle = 2.0 * PI * (k * t) as f64 / period as f64;
        row.push(angle.sin());
        row.push(angle.cos());
    }
    row
}

fn dot(row: &[f64], coefficients: &[f64]) -> f64 {
    row.iter().zip(coefficients).map(|(x, b)| x * b).sum()
}

impl ForecastModel for HarmonicRegression {
    fn tier(&self) -> ModelTier {
        ModelTier::Seasonal
    }

    fn train(&self, values: &[f64], ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>> {
        let n = values.len();
        let needed = self.min_observations();
        if n < needed {
            return Err(FitError::InsufficientHistory { needed, got: n });
        }
        ensure_finite(values)?;
        ctx.check()?;

        let design: Vec<Vec<f64>> = (0..n)
            .map(|t| design_row(t, n, self.period, self.harmonics))
            .collect();

        let coefficients = least_squares(&design, values).map_err(|e| match e {
            MathError::CalculationError(msg) => FitError::NonConvergence(msg),
            other => FitError::Math(other),
        })?;
        ctx.check()?;

        let rss: f64 = design
            .iter()
            .zip(values)
            .map(|(row, y)| (y - dot(row, &coefficients)).powi(2))
            .sum();
        let dof = n.saturating_sub(coefficients.len()).max(1);
        let residual_std = (rss / dof as f64).sqrt();

        if !residual_std.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(FitError::NonConvergence(
                "harmonic regression produced non-finite coefficients".to_string(),
            ));
        }

        Ok(Box::new(TrainedHarmonicRegression {
            coefficients,
            period: self.period,
            harmonics: self.harmonics,
            observations: n,
            residual_std,
            z: z_for_level(self.interval_level),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedHarmonicRegression {
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }
}

impl TrainedForecastModel for TrainedHarmonicRegression {
    fn forecast(&self, horizon: usize) -> FitResult<ModelForecast> {
        let n = self.observations;
        let mut points = Vec::with_capacity(horizon);
        let mut half_widths = Vec::with_capacity(horizon);

        for step in 1..=horizon {
            let row = design_row(n - 1 + step, n, self.period, self.harmonics);
            points.push(dot(&row, &self.coefficients));
            // Widen with distance from the data
            half_widths.push(self.z * self.residual_std * (1.0 + step as f64 / n as f64).sqrt());
        }

        ModelForecast::from_half_widths(points, &half_widths)
    }

    fn name(&self) -> String {
        "Harmonic Regression (Seasonal)".to_string()
    }
}
