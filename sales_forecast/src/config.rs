//! Tunable thresholds for the forecasting pipeline
//!
//! Every constant the engine relies on lives here so deployments can tune
//! them without code changes. Defaults match the production dashboard.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level forecasting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    pub selection: SelectionConfig,
    pub anomaly: AnomalyConfig,
    pub backtest: BacktestConfig,
    pub confidence: ConfidenceConfig,
    pub uplift: UpliftConfig,
    pub aggregation: AggregationConfig,
    pub cache: CacheConfig,
}

impl ForecastConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ForecastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject settings the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        self.selection.validate()?;
        self.anomaly.validate()?;
        self.backtest.validate()?;
        self.confidence.validate()?;
        self.uplift.validate()?;
        self.aggregation.validate()?;
        Ok(())
    }
}

/// Model tier thresholds and per-model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Non-zero weeks needed before the seasonal tier is attempted
    pub seasonal_min_weeks: usize,
    /// Non-zero weeks needed before the trend tier is attempted
    pub trend_min_weeks: usize,
    /// Wall-clock budget for a single tier fit, in milliseconds
    pub fit_timeout_ms: u64,
    /// Length of one seasonal cycle in weeks
    pub seasonal_period: usize,
    /// Number of Fourier harmonics in the seasonal model
    pub fourier_order: usize,
    /// Highest AR order tried by the trend model
    pub max_ar_order: usize,
    /// Coverage of the prediction intervals for the statistical tiers
    pub interval_level: f64,
    /// Half-width of the baseline band as a fraction of the point forecast
    pub baseline_band: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            seasonal_min_weeks: 52,
            trend_min_weeks: 16,
            fit_timeout_ms: 20_000,
            seasonal_period: 52,
            fourier_order: 3,
            max_ar_order: 3,
            interval_level: 0.85,
            baseline_band: 0.15,
        }
    }
}

impl SelectionConfig {
    /// Time budget for one fit attempt
    pub fn fit_timeout(&self) -> Duration {
        Duration::from_millis(self.fit_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.trend_min_weeks == 0 || self.seasonal_min_weeks < self.trend_min_weeks {
            return Err(ForecastError::ConfigError(format!(
                "seasonal_min_weeks ({}) must be >= trend_min_weeks ({}) > 0",
                self.seasonal_min_weeks, self.trend_min_weeks
            )));
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::ConfigError(
                "seasonal_period must be at least 2".to_string(),
            ));
        }
        if self.fourier_order == 0 || 2 * self.fourier_order >= self.seasonal_period {
            return Err(ForecastError::ConfigError(format!(
                "fourier_order must be between 1 and {}",
                (self.seasonal_period - 1) / 2
            )));
        }
        if self.fit_timeout_ms == 0 {
            return Err(ForecastError::ConfigError(
                "fit_timeout_ms must be positive".to_string(),
            ));
        }
        if self.interval_level <= 0.0 || self.interval_level >= 1.0 {
            return Err(ForecastError::ConfigError(
                "interval_level must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.baseline_band) {
            return Err(ForecastError::ConfigError(
                "baseline_band must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Value substituted for a flagged week in the fitting series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapStrategy {
    Median,
    Mean,
}

/// Outlier detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnomalyConfig {
    /// |z| above this marks a week as anomalous
    pub zscore_threshold: f64,
    pub cap_strategy: CapStrategy,
    /// Series with fewer non-zero weeks are never flagged
    pub min_points: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            zscore_threshold: 3.0,
            cap_strategy: CapStrategy::Median,
            min_points: 4,
        }
    }
}

impl AnomalyConfig {
    fn validate(&self) -> Result<()> {
        if !(self.zscore_threshold > 0.0) {
            return Err(ForecastError::ConfigError(
                "zscore_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rolling-origin backtest settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestConfig {
    /// Fewer scored steps than this and metrics are reported as unavailable
    pub min_steps: usize,
    /// Smallest training window for the baseline tier
    pub baseline_min_train: usize,
    /// Only score the most recent origins when set
    pub max_steps: Option<usize>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            min_steps: 3,
            baseline_min_train: 8,
            max_steps: None,
        }
    }
}

impl BacktestConfig {
    fn validate(&self) -> Result<()> {
        if self.min_steps == 0 || self.baseline_min_train < 2 {
            return Err(ForecastError::ConfigError(
                "min_steps must be >= 1 and baseline_min_train >= 2".to_string(),
            ));
        }
        if self.max_steps.is_some_and(|max| max < self.min_steps) {
            return Err(ForecastError::ConfigError(
                "max_steps cannot be below min_steps".to_string(),
            ));
        }
        Ok(())
    }
}

/// MAPE cut-offs for the confidence label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfidenceConfig {
    pub high_mape: f64,
    pub medium_mape: f64,
    /// Without metrics, fewer non-zero weeks than this is labelled UNKNOWN
    pub min_weeks_for_label: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            high_mape: 15.0,
            medium_mape: 30.0,
            min_weeks_for_label: 4,
        }
    }
}

impl ConfidenceConfig {
    fn validate(&self) -> Result<()> {
        if !(self.high_mape > 0.0 && self.high_mape <= self.medium_mape) {
            return Err(ForecastError::ConfigError(format!(
                "expected 0 < high_mape ({}) <= medium_mape ({})",
                self.high_mape, self.medium_mape
            )));
        }
        Ok(())
    }
}

/// Multiplicative boost for weeks inside a seasonal peak window.
///
/// A forecast week is boosted when its start date (the Monday it is
/// labelled with) falls in the window; a week that only ends inside it is
/// left alone. This is a business heuristic layered on top of the
/// statistical forecast, not part of any model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpliftConfig {
    pub enabled: bool,
    /// (month, day) the window opens, inclusive
    pub start: (u32, u32),
    /// (month, day) the window closes, inclusive
    pub end: (u32, u32),
    pub multiplier: f64,
}

impl Default for UpliftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: (12, 18),
            end: (12, 31),
            multiplier: 1.15,
        }
    }
}

impl UpliftConfig {
    pub const MAX_MULTIPLIER: f64 = 2.0;

    fn validate(&self) -> Result<()> {
        if !(1.0..=Self::MAX_MULTIPLIER).contains(&self.multiplier) {
            return Err(ForecastError::ConfigError(format!(
                "uplift multiplier must be within [1.0, {}]",
                Self::MAX_MULTIPLIER
            )));
        }
        let valid_day = |(month, day): (u32, u32)| (1..=12).contains(&month) && (1..=31).contains(&day);
        if !valid_day(self.start) || !valid_day(self.end) || self.start > self.end {
            return Err(ForecastError::ConfigError(
                "uplift window must be an ordered (month, day) range within one year".to_string(),
            ));
        }
        Ok(())
    }
}

/// How negative transaction values (returns) enter the weekly totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeValuePolicy {
    /// Returns reduce the week's total
    Keep,
    /// Returns count as positive volume
    Absolute,
    /// Returns are ignored
    Drop,
}

/// Weekly aggregation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    pub negative_values: NegativeValuePolicy,
    /// Percentage of zero weeks above which a sparsity warning is raised
    pub sparsity_warning_pct: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            negative_values: NegativeValuePolicy::Keep,
            sparsity_warning_pct: 30.0,
        }
    }
}

impl AggregationConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.sparsity_warning_pct) {
            return Err(ForecastError::ConfigError(
                "sparsity_warning_pct must be a percentage".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory forecast cache bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub max_entries: usize,
    /// Entry lifetime in seconds; 0 keeps entries until evicted
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}
