//! End-to-end forecast generation
//!
//! `transactions -> weekly series -> anomaly capping -> tier selection ->
//! horizon forecast -> peak uplift -> backtest -> confidence`.
//!
//! Models see only the non-zero weeks, with anomalies capped. The backtest
//! scores against the same weeks with their true totals, and `historical`
//! always reports the full, uncapped weekly series.

use crate::anomaly::{AnomalyDetector, AnomalyFlag};
use crate::backtest::Backtester;
use crate::cache::{ForecastCache, ForecastKey};
use crate::config::{ForecastConfig, UpliftConfig};
use crate::confidence::AccuracyMetrics;
use crate::data::{FilteredTransactions, Horizon};
use crate::error::{ForecastError, Result};
use crate::events::{EventSink, ForecastEvent, TracingEventSink};
use crate::models::{ModelForecast, ModelTier, TierModels};
use crate::selector::{ModelSelector, TierAttempt};
use crate::series::{WeeklyPoint, WeeklySeries};
use crate::utils::{date_in_window, future_week_starts, round_to, week_label};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// One forecasted week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Display label, e.g. "06 Jan"
    #[serde(rename = "week")]
    pub week_label: String,
    pub week_start: NaiveDate,
    #[serde(rename = "sales")]
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Everything the dashboard shows for one forecast request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    /// Label of the model that produced the forecast
    pub model_used: String,
    pub tier: ModelTier,
    /// Full weekly series with true totals, zero weeks included
    pub historical: WeeklySeries,
    pub forecast: Vec<ForecastPoint>,
    pub accuracy: AccuracyMetrics,
    /// Sum of the point forecasts
    #[serde(rename = "totalForecast")]
    pub total: f64,
    /// Weeks that were capped before fitting
    pub anomalies: Vec<AnomalyFlag>,
    /// Tiers tried, in order
    pub selection_trail: Vec<TierAttempt>,
    /// Share of weeks without sales, in percent
    pub sparsity_pct: f64,
}

impl ForecastResult {
    /// The last `n` weeks that recorded sales, oldest first
    pub fn recent_history(&self, n: usize) -> Vec<WeeklyPoint> {
        self.historical.recent_non_zero(n)
    }

    /// True when a higher tier was tried and the result comes from a lower one
    pub fn is_fallback(&self) -> bool {
        self.selection_trail.len() > 1
    }

    /// Stable fingerprint of the forecast output (hex SHA-256)
    pub fn digest(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.model_used.as_bytes());
        hasher.update(serde_json::to_vec(&self.forecast)?);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Configured forecasting engine
pub struct ForecastPipeline {
    config: ForecastConfig,
    models: TierModels,
    events: Arc<dyn EventSink>,
}

impl ForecastPipeline {
    /// Build a pipeline from a validated configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let models = TierModels::from_config(&config.selection);
        Ok(Self {
            config,
            models,
            events: Arc::new(TracingEventSink),
        })
    }

    /// Replace the per-tier models
    pub fn with_models(mut self, models: TierModels) -> Self {
        self.models = models;
        self
    }

    /// Send events somewhere other than `tracing`
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `horizon` weeks beyond the last week of `input`.
    ///
    /// Fails only when there is nothing to model (no rows, or no week with
    /// sales) or the horizon is zero; every other weakness in the data is
    /// absorbed by tier fallback and reflected in the confidence label.
    pub fn generate_forecast(
        &self,
        input: &FilteredTransactions,
        horizon: usize,
    ) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least one week".to_string(),
            ));
        }
        let required_days = Some(horizon as i64 * 7);

        let weekly =
            WeeklySeries::from_transactions(input.rows(), self.config.aggregation.negative_values);
        let last_week = match weekly.last_week() {
            Some(week) => week,
            None => {
                return Err(ForecastError::InsufficientData {
                    reason: "no transactions to forecast from".to_string(),
                    span_days: None,
                    required_days,
                })
            }
        };

        let active = weekly.non_zero_indices();
        if active.is_empty() {
            return Err(ForecastError::InsufficientData {
                reason: "no week recorded any sales".to_string(),
                span_days: input.span_days(),
                required_days,
            });
        }

        let sparsity_pct = weekly.sparsity_pct();
        if sparsity_pct > self.config.aggregation.sparsity_warning_pct {
            self.events.record(ForecastEvent::HighSparsity {
                zero_week_pct: round_to(sparsity_pct, 1),
            });
        }

        let report = AnomalyDetector::new(self.config.anomaly.clone()).detect(&weekly);
        if report.has_anomalies() {
            self.events.record(ForecastEvent::AnomaliesFlagged {
                indices: report.flagged_indices(),
                threshold: self.config.anomaly.zscore_threshold,
            });
        }

        let totals = weekly.values();
        let fit_values: Vec<f64> = active.iter().map(|&i| report.capped[i]).collect();
        let observed: Vec<f64> = active.iter().map(|&i| totals[i]).collect();

        let choice = ModelSelector::new(&self.config.selection, &self.models, self.events.as_ref())
            .select(&fit_values, horizon);

        let forecast = forecast_points(choice.forecast(), last_week, &self.config.uplift);
        let total = round_to(forecast.iter().map(|p| p.point).sum(), 2);

        let backtest = Backtester::new(
            &self.config.selection,
            &self.config.backtest,
            &self.models,
            self.events.as_ref(),
        )
        .run(choice.tier(), &observed);
        let accuracy =
            AccuracyMetrics::from_backtest(backtest.as_ref(), active.len(), &self.config.confidence);

        Ok(ForecastResult {
            model_used: choice.label().to_string(),
            tier: choice.tier(),
            historical: weekly,
            forecast,
            accuracy,
            total,
            anomalies: report.flags,
            selection_trail: choice.trail().to_vec(),
            sparsity_pct: round_to(sparsity_pct, 2),
        })
    }

    /// Forecast one of the dashboard's standard horizons
    pub fn generate_for(&self, input: &FilteredTransactions, horizon: Horizon) -> Result<ForecastResult> {
        self.generate_forecast(input, horizon.weeks())
    }

    /// Like [`generate_forecast`](Self::generate_forecast), memoised in `cache`.
    ///
    /// Errors are not cached. When two callers miss at once, both compute
    /// and the first stored result is returned to both.
    pub fn generate_cached(
        &self,
        cache: &dyn ForecastCache,
        input: &FilteredTransactions,
        horizon: usize,
    ) -> Result<ForecastResult> {
        let key = ForecastKey::for_input(input, horizon);
        if let Some(hit) = cache.get(&key) {
            self.events.record(ForecastEvent::CacheHit {
                key: key.to_string(),
            });
            return Ok(hit);
        }

        self.events.record(ForecastEvent::CacheMiss {
            key: key.to_string(),
        });
        let result = self.generate_forecast(input, horizon)?;
        Ok(cache.put(key, result))
    }
}

impl Default for ForecastPipeline {
    fn default() -> Self {
        let config = ForecastConfig::default();
        Self {
            models: TierModels::from_config(&config.selection),
            config,
            events: Arc::new(TracingEventSink),
        }
    }
}

/// Forecast with the default configuration, logging through `tracing`
pub fn generate_forecast(input: &FilteredTransactions, horizon: usize) -> Result<ForecastResult> {
    ForecastPipeline::default().generate_forecast(input, horizon)
}

/// Label, uplift and round the model output
fn forecast_points(forecast: &ModelForecast, last_week: NaiveDate, uplift: &UpliftConfig) -> Vec<ForecastPoint> {
    let weeks = future_week_starts(last_week, forecast.horizons());

    weeks
        .into_iter()
        .zip(forecast.values().iter().zip(forecast.intervals()))
        .map(|(week_start, (&point, &(lower, upper)))| {
            let factor = if uplift.enabled && date_in_window(week_start, uplift.start, uplift.end) {
                uplift.multiplier
            } else {
                1.0
            };
            ForecastPoint {
                week_label: week_label(week_start),
                week_start,
                point: round_to(point * factor, 2),
                lower: round_to(lower * factor, 2),
                upper: round_to(upper * factor, 2),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_uplift_applies_to_peak_weeks_only() {
        let forecast = ModelForecast::from_half_widths(vec![100.0; 3], &[10.0; 3]).unwrap();
        // Following weeks start Dec 16, Dec 23 and Dec 30
        let points = forecast_points(&forecast, day(2024, 12, 9), &UpliftConfig::default());

        assert_eq!(points[0].point, 100.0);
        assert_eq!(points[1].point, 115.0);
        assert_eq!(points[2].point, 115.0);
        assert_eq!(points[1].lower, 103.5);
        assert_eq!(points[1].upper, 126.5);
        assert_eq!(points[0].week_label, "16 Dec");
    }

    #[test]
    fn test_uplift_keys_on_week_start() {
        let forecast = ModelForecast::from_half_widths(vec![100.0; 2], &[10.0; 2]).unwrap();
        // Mon Dec 29 2025 is boosted, Mon Jan 5 2026 is not
        let points = forecast_points(&forecast, day(2025, 12, 22), &UpliftConfig::default());
        assert_eq!(points[0].point, 115.0);
        assert_eq!(points[1].point, 100.0);
    }

    #[test]
    fn test_uplift_disabled() {
        let forecast = ModelForecast::from_half_widths(vec![100.0], &[10.0]).unwrap();
        let uplift = UpliftConfig {
            enabled: false,
            ..UpliftConfig::default()
        };
        let points = forecast_points(&forecast, day(2024, 12, 16), &uplift);
        assert_eq!(points[0].point, 100.0);
    }
}
