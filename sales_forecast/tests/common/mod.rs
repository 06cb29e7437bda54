//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::NaiveDate;
use parking_lot::Mutex;
use sales_forecast::error::{FitError, FitResult};
use sales_forecast::models::{ArimaModel, FitContext, ForecastModel, ModelTier, TrainedForecastModel};
use sales_forecast::pipeline::ForecastResult;
use sales_forecast::synthetic::{
    seasonal_weekly, sparse_weekly, to_transactions, trending_weekly, with_spike,
};
use sales_forecast::{Confidence, FilteredTransactions};
use std::thread;
use std::time::Duration;

pub fn first_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

/// Two years with a clear yearly cycle
pub fn seasonal_input() -> FilteredTransactions {
    to_transactions("seasonal", first_monday(), &seasonal_weekly(104, 15.0, 42))
}

/// Thirty weeks of a noisy upward trend
pub fn trending_input() -> FilteredTransactions {
    to_transactions("trending", first_monday(), &trending_weekly(30, 800.0, 25.0, 0.35, 7))
}

/// Ten weeks with every third week empty
pub fn sparse_input() -> FilteredTransactions {
    to_transactions("sparse", first_monday(), &sparse_weekly(10, 200.0, 3, 5))
}

/// Forty stable weeks with one huge spike in the middle
pub fn spike_values() -> Vec<f64> {
    let stable = trending_weekly(40, 500.0, 0.0, 0.02, 3);
    with_spike(&stable, 20, 10.0)
}

pub fn spike_input() -> FilteredTransactions {
    to_transactions("spike", first_monday(), &spike_values())
}

/// Every interval is ordered and non-negative
pub fn assert_well_formed(result: &ForecastResult, horizon: usize) {
    assert_eq!(result.forecast.len(), horizon);
    for point in &result.forecast {
        assert!(point.lower >= 0.0, "negative lower bound in {:?}", point);
        assert!(
            point.lower <= point.point && point.point <= point.upper,
            "unordered interval {:?}",
            point
        );
    }
}

/// The label agrees with the reported MAPE
pub fn assert_confidence_consistent(result: &ForecastResult) {
    let accuracy = &result.accuracy;
    match accuracy.mape {
        Some(mape) if mape < 15.0 => assert_eq!(accuracy.confidence, Confidence::High),
        Some(mape) if mape < 30.0 => assert_eq!(accuracy.confidence, Confidence::Medium),
        Some(_) => assert_eq!(accuracy.confidence, Confidence::Low),
        None => assert!(matches!(
            accuracy.confidence,
            Confidence::Low | Confidence::Unknown
        )),
    }
}

/// Model that ignores its deadline and sleeps before failing
#[derive(Debug)]
pub struct SlowModel {
    pub tier: ModelTier,
    pub delay: Duration,
}

impl ForecastModel for SlowModel {
    fn tier(&self) -> ModelTier {
        self.tier
    }

    fn train(&self, _values: &[f64], _ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>> {
        thread::sleep(self.delay);
        Err(FitError::NonConvergence("slow model never converges".to_string()))
    }

    fn name(&self) -> &str {
        "Slow"
    }
}

/// Model that always fails
#[derive(Debug)]
pub struct FailingModel(pub ModelTier);

impl ForecastModel for FailingModel {
    fn tier(&self) -> ModelTier {
        self.0
    }

    fn train(&self, _values: &[f64], _ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>> {
        Err(FitError::NonConvergence("matrix is singular".to_string()))
    }

    fn name(&self) -> &str {
        "Failing"
    }
}

/// Trend model that records every series it is trained on
#[derive(Debug)]
pub struct RecordingTrendModel {
    inner: ArimaModel,
    seen: Mutex<Vec<Vec<f64>>>,
}

impl RecordingTrendModel {
    pub fn new() -> Self {
        Self {
            inner: ArimaModel::new(3, 0.85),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<Vec<f64>> {
        self.seen.lock().clone()
    }
}

impl ForecastModel for RecordingTrendModel {
    fn tier(&self) -> ModelTier {
        ModelTier::Trend
    }

    fn train(&self, values: &[f64], ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>> {
        self.seen.lock().push(values.to_vec());
        self.inner.train(values, ctx)
    }

    fn name(&self) -> &str {
        "Recording ARIMA"
    }
}

/// Trend model that ignores its deadline and stalls on windows shorter
/// than `stall_below`, as backtest refits are
#[derive(Debug)]
pub struct StallingTrendModel {
    pub inner: ArimaModel,
    pub stall_below: usize,
    pub delay: Duration,
}

impl StallingTrendModel {
    pub fn new(stall_below: usize, delay: Duration) -> Self {
        Self {
            inner: ArimaModel::new(3, 0.85),
            stall_below,
            delay,
        }
    }
}

impl ForecastModel for StallingTrendModel {
    fn tier(&self) -> ModelTier {
        ModelTier::Trend
    }

    fn train(&self, values: &[f64], _ctx: &FitContext) -> FitResult<Box<dyn TrainedForecastModel>> {
        if values.len() < self.stall_below {
            thread::sleep(self.delay);
        }
        self.inner.train(values, &FitContext::unbounded())
    }

    fn name(&self) -> &str {
        "Stalling ARIMA"
    }
}
