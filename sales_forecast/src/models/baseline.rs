//! Linear baseline, the tier of last resort

use crate::error::FitResult;
use crate::models::{FitContext, ForecastModel, ModelForecast, ModelTier, TrainedForecastModel};
use serde::{Deserialize, Serialize};
use series_math::LinearRegression;

/// Straight line through the weekly values with a fixed relative band
#[derive(Debug, Clone)]
pub struct LinearBaseline {
    /// Half-width of the band as a fraction of the point forecast
    band: f64,
}

/// Fitted baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLinearBaseline {
    line: LinearRegression,
    band: f64,
}

impl LinearBaseline {
    pub fn new(band: f64) -> Self {
        Self { band }
    }

    /// Fit without any failure path.
    ///
    /// A single observation gives a flat line; no usable observations give
    /// a flat line at zero.
    pub fn fit(&self, values: &[f64]) -> TrainedLinearBaseline {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

        let line = LinearRegression::fit(&finite).unwrap_or_else(|_| LinearRegression::flat(0.0, 0));

        TrainedLinearBaseline {
            line,
            band: self.band,
        }
    }
}

impl Default for LinearBaseline {
    fn default() -> Self {
        Self::new(0.15)
    }
}

impl ForecastModel for LinearBaseline {
    fn tier(&self) -> ModelTier {
        ModelTier::Baseline
    }

    fn train(&self, values: &[f64], _ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>> {
        Ok(Box::new(self.fit(values)))
    }

    fn name(&self) -> &str {
        "Linear Baseline"
    }
}

impl TrainedLinearBaseline {
    pub fn slope(&self) -> f64 {
        self.line.slope()
    }

    pub fn intercept(&self) -> f64 {
        self.line.intercept()
    }

    /// Value of the line `periods_ahead` weeks after the last observation
    pub fn project(&self, periods_ahead: usize) -> f64 {
        let x = (self.line.observations() + periods_ahead).saturating_sub(1) as f64;
        self.line.predict_at(x)
    }
}

impl TrainedForecastModel for TrainedLinearBaseline {
    fn forecast(&self, horizon: usize) -> FitResult<ModelForecast> {
        let points: Vec<f64> = (1..=horizon).map(|step| self.project(step)).collect();
        let half_widths: Vec<f64> = points.iter().map(|p| p.abs() * self.band).collect();
        ModelForecast::from_half_widths(points, &half_widths)
    }

    fn name(&self) -> String {
        "Linear Baseline".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extends_line() {
        let trained = LinearBaseline::default().fit(&[10.0, 12.0, 14.0, 16.0]);
        let forecast = trained.forecast(2).unwrap();

        assert!((forecast.values()[0] - 18.0).abs() < 1e-9);
        assert!((forecast.values()[1] - 20.0).abs() < 1e-9);
        let (lower, upper) = forecast.intervals()[0];
        assert!((lower - 18.0 * 0.85).abs() < 1e-9);
        assert!((upper - 18.0 * 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_is_flat() {
        let forecast = LinearBaseline::default().fit(&[42.0]).forecast(3).unwrap();
        assert_eq!(forecast.values(), &[42.0, 42.0, 42.0]);
    }

    #[test]
    fn test_declining_line_floors_at_zero() {
        let forecast = LinearBaseline::default()
            .fit(&[30.0, 20.0, 10.0])
            .forecast(3)
            .unwrap();
        assert_eq!(forecast.values(), &[0.0, 0.0, 0.0]);
        for (lower, upper) in forecast.intervals() {
            assert!(*lower <= *upper);
        }
    }

    #[test]
    fn test_fitted_line_serializes() {
        let trained = LinearBaseline::new(0.2).fit(&[5.0, 7.0, 9.0]);
        let json = serde_json::to_value(&trained).unwrap();

        assert_eq!(json["band"], 0.2);
        assert!((json["line"]["slope"].as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(json["line"]["observations"], 3);

        let restored: TrainedLinearBaseline = serde_json::from_value(json).unwrap();
        assert_eq!(restored.project(1), trained.project(1));
    }

    #[test]
    fn test_empty_input_never_fails() {
        let forecast = LinearBaseline::default().fit(&[]).forecast(2).unwrap();
        assert_eq!(forecast.values(), &[0.0, 0.0]);
    }
}
