//! ARIMA models for time series forecasting
//!
//! The trend tier fits ARIMA(p,1,0) with drift: an autoregression on the
//! first differences plus a constant. Orders `0..=max_p` are estimated by
//! least squares and the one with the lowest AIC wins. Orders whose AR
//! coefficients are not stationary are discarded; `p = 0` (a random walk
//! with drift) always qualifies.

use crate::error::{FitError, FitResult};
use crate::models::{
    ensure_finite, z_for_level, FitContext, ForecastModel, ModelForecast, ModelTier,
    TrainedForecastModel,
};
use series_math::least_squares;

/// Smallest residual variance used in the AIC, so exact fits stay comparable
const MIN_VARIANCE: f64 = 1e-12;

/// ARIMA(p,1,0) with automatic order selection
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// Highest AR order tried
    max_p: usize,
    interval_level: f64,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    /// Selected AR order
    p: usize,
    /// Constant term of the differenced series
    drift: f64,
    /// Fitted AR coefficients, lag 1 first
    ar_coefficients: Vec<f64>,
    /// Last observed level
    last_value: f64,
    /// Most recent differences, oldest first (at least `p` of them)
    recent_diffs: Vec<f64>,
    /// Innovation standard deviation
    sigma: f64,
    aic: f64,
    z: f64,
}

/// One estimated order, before selection
#[derive(Debug, Clone)]
struct Candidate {
    p: usize,
    drift: f64,
    ar_coefficients: Vec<f64>,
    sigma: f64,
    aic: f64,
}

impl ArimaModel {
    /// Create a new ARIMA model trying AR orders up to `max_p`
    pub fn new(max_p: usize, interval_level: f64) -> Self {
        Self {
            name: format!("ARIMA(p<={},1,0)", max_p),
            max_p,
            interval_level,
        }
    }

    /// Fewest observations a fit accepts
    pub fn min_observations(&self) -> usize {
        // drift-only model on the differences needs a few residual degrees of freedom
        4
    }

    /// Highest order that keeps two residual degrees of freedom on `n` differences
    fn usable_order(&self, n: usize) -> usize {
        (0..=self.max_p).rev().find(|&p| n >= 2 * p + 3).unwrap_or(0)
    }

    /// Estimate AR(p) with constant on the differenced series, using the
    /// targets from `start` on so every order is scored on the same rows
    fn estimate(diffs: &[f64], p: usize, start: usize) -> Option<Candidate> {
        if p > start {
            return None;
        }
        let rows = diffs.len().checked_sub(start)?;
        // Keep at least two residual degrees of freedom
        if rows < p + 3 {
            return None;
        }

        let design: Vec<Vec<f64>> = (start..diffs.len())
            .map(|t| {
                let mut row = Vec::with_capacity(p + 1);
                row.push(1.0);
                row.extend((1..=p).map(|lag| diffs[t - lag]));
                row
            })
            .collect();
        let targets = &diffs[start..];

        let beta = least_squares(&design, targets).ok()?;
        let drift = beta[0];
        let ar_coefficients = beta[1..].to_vec();

        // Stationarity (sufficient condition)
        if ar_coefficients.iter().map(|phi| phi.abs()).sum::<f64>() >= 1.0 {
            return None;
        }

        let rss: f64 = design
            .iter()
            .zip(targets)
            .map(|(row, y)| {
                let fitted: f64 = row.iter().zip(&beta).map(|(x, b)| x * b).sum();
                (y - fitted).powi(2)
            })
            .sum();

        let m = rows as f64;
        let k = (p + 1) as f64;
        let aic = m * (rss / m).max(MIN_VARIANCE).ln() + 2.0 * k;
        let sigma = (rss / (m - k).max(1.0)).sqrt();

        if !aic.is_finite() || !sigma.is_finite() || !drift.is_finite() {
            return None;
        }

        Some(Candidate {
            p,
            drift,
            ar_coefficients,
            sigma,
            aic,
        })
    }
}

impl ForecastModel for ArimaModel {
    fn tier(&self) -> ModelTier {
        ModelTier::Trend
    }

    fn train(&self, values: &[f64], ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>> {
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(FitError::InsufficientHistory {
                needed,
                got: values.len(),
            });
        }
        ensure_finite(values)?;

        let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

        let start = self.usable_order(diffs.len());
        let mut best: Option<Candidate> = None;
        for p in 0..=start {
            ctx.check()?;
            if let Some(candidate) = Self::estimate(&diffs, p, start) {
                // Strict comparison keeps the smaller order on ties
                if best.as_ref().map_or(true, |b| candidate.aic < b.aic) {
                    best = Some(candidate);
                }
            }
        }

        let best = best.ok_or_else(|| {
            FitError::NonConvergence("no ARIMA order could be estimated".to_string())
        })?;

        let keep = best.p.max(1).min(diffs.len());
        let last_value = values[values.len() - 1];

        Ok(Box::new(TrainedArimaModel {
            p: best.p,
            drift: best.drift,
            ar_coefficients: best.ar_coefficients,
            last_value,
            recent_diffs: diffs[diffs.len() - keep..].to_vec(),
            sigma: best.sigma,
            aic: best.aic,
            z: z_for_level(self.interval_level),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    /// Selected AR order
    pub fn order(&self) -> usize {
        self.p
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Psi weights of the integrated process, cumulative over the AR psi weights
    fn integrated_psi(&self, horizon: usize) -> Vec<f64> {
        let mut psi = Vec::with_capacity(horizon);
        let mut cumulative = Vec::with_capacity(horizon);
        let mut running = 0.0;

        for j in 0..horizon {
            let weight = if j == 0 {
                1.0
            } else {
                (1..=self.p.min(j))
                    .map(|i| self.ar_coefficients[i - 1] * psi[j - i])
                    .sum()
            };
            psi.push(weight);
            running += weight;
            cumulative.push(running);
        }

        cumulative
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizon: usize) -> FitResult<ModelForecast> {
        let mut history = self.recent_diffs.clone();
        let mut level = self.last_value;
        let mut points = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let mut next_diff = self.drift;
            for (lag, phi) in self.ar_coefficients.iter().enumerate() {
                next_diff += phi * history[history.len() - 1 - lag];
            }
            history.push(next_diff);
            level += next_diff;
            points.push(level);
        }

        let mut variance = 0.0;
        let half_widths: Vec<f64> = self
            .integrated_psi(horizon)
            .into_iter()
            .map(|psi| {
                variance += psi * psi;
                self.z * self.sigma * variance.sqrt()
            })
            .collect();

        ModelForecast::from_half_widths(points, &half_widths)
    }

    fn name(&self) -> String {
        format!("ARIMA({},1,0) (Trend)", self.p)
    }
}
