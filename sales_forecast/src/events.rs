//! Structured events emitted while a forecast is produced.
//!
//! The pipeline never logs directly; it hands events to an [`EventSink`].
//! The default sink forwards them to `tracing`, tests use
//! [`RecordingEventSink`] to assert on what happened.

use crate::models::ModelTier;
use parking_lot::Mutex;
use std::time::Duration;

/// Something noteworthy that happened during a forecast run
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastEvent {
    /// Weeks whose totals were replaced in the fitting series
    AnomaliesFlagged { indices: Vec<usize>, threshold: f64 },
    /// Too many weeks without any sales
    HighSparsity { zero_week_pct: f64 },
    /// A tier raised an error while fitting
    FitFailed { tier: ModelTier, reason: String },
    /// A tier ran past its time budget
    FitTimedOut { tier: ModelTier, budget: Duration },
    /// The tier whose forecast is returned
    TierSelected { tier: ModelTier, label: String },
    /// Not enough history to score the model
    BacktestSkipped { tier: ModelTier, available_steps: usize, required_steps: usize },
    /// One walk-forward refit failed and was left out of the metrics
    BacktestStepFailed { tier: ModelTier, origin: usize, reason: String },
    CacheHit { key: String },
    CacheMiss { key: String },
}

/// Receiver for forecast events
pub trait EventSink: Send + Sync {
    fn record(&self, event: ForecastEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: ForecastEvent) {
        match event {
            ForecastEvent::AnomaliesFlagged { indices, threshold } => {
                tracing::warn!(count = indices.len(), ?indices, threshold, "anomalous weeks capped for fitting");
            }
            ForecastEvent::HighSparsity { zero_week_pct } => {
                tracing::warn!(zero_week_pct, "high sparsity: many weeks have no sales");
            }
            ForecastEvent::FitFailed { tier, reason } => {
                tracing::warn!(%tier, %reason, "model fit failed, falling back");
            }
            ForecastEvent::FitTimedOut { tier, budget } => {
                tracing::warn!(%tier, budget_ms = budget.as_millis() as u64, "model fit timed out, falling back");
            }
            ForecastEvent::TierSelected { tier, label } => {
                tracing::info!(%tier, %label, "forecast model selected");
            }
            ForecastEvent::BacktestSkipped { tier, available_steps, required_steps } => {
                tracing::warn!(%tier, available_steps, required_steps, "backtest skipped: not enough history");
            }
            ForecastEvent::BacktestStepFailed { tier, origin, reason } => {
                tracing::debug!(%tier, origin, %reason, "backtest refit failed");
            }
            ForecastEvent::CacheHit { key } => tracing::debug!(%key, "forecast cache hit"),
            ForecastEvent::CacheMiss { key } => tracing::debug!(%key, "forecast cache miss"),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ForecastEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<ForecastEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingEventSink {
    fn record(&self, event: ForecastEvent) {
        self.events.lock().push(event);
    }
}
