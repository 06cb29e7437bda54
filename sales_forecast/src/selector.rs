//! Tiered model selection
//!
//! Selection is a small state machine over the tiers:
//!
//! ```text
//! NotAttempted -> TrySeasonal -> TryTrend -> UseBaseline -> Done
//!              \-------------> TryTrend
//!              \--------------------------> UseBaseline
//! ```
//!
//! The entry state depends only on how many non-zero weeks there are. A
//! failing or timed-out tier moves to the next one; the baseline cannot
//! fail, so every run ends in `Done`.

use crate::config::SelectionConfig;
use crate::error::FitResult;
use crate::events::{EventSink, ForecastEvent};
use crate::guard::run_with_deadline;
use crate::models::{ForecastModel, ModelForecast, ModelTier, TierModels, TrainedForecastModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where the selector is in the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    NotAttempted,
    TrySeasonal,
    TryTrend,
    UseBaseline,
    Done(ModelTier),
}

/// What happened when a tier was tried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed(String),
    TimedOut,
}

/// One entry of the selection trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAttempt {
    pub tier: ModelTier,
    pub outcome: AttemptOutcome,
}

impl SelectionState {
    /// Entry state for a series with `non_zero_weeks` weeks of sales
    pub fn initial(non_zero_weeks: usize, config: &SelectionConfig) -> Self {
        if non_zero_weeks >= config.seasonal_min_weeks {
            SelectionState::TrySeasonal
        } else if non_zero_weeks >= config.trend_min_weeks {
            SelectionState::TryTrend
        } else {
            SelectionState::UseBaseline
        }
    }

    /// Transition after an attempt in this state finished
    pub fn next(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (SelectionState::TrySeasonal, true) => SelectionState::Done(ModelTier::Seasonal),
            (SelectionState::TrySeasonal, false) => SelectionState::TryTrend,
            (SelectionState::TryTrend, true) => SelectionState::Done(ModelTier::Trend),
            (SelectionState::TryTrend, false) => SelectionState::UseBaseline,
            (SelectionState::UseBaseline, _) => SelectionState::Done(ModelTier::Baseline),
            (state, _) => state,
        }
    }
}

/// The selected tier with its forecast
#[derive(Debug, Clone)]
pub struct ModelChoice {
    tier: ModelTier,
    label: String,
    forecast: ModelForecast,
    trail: Vec<TierAttempt>,
}

impl ModelChoice {
    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    /// Label shown to users, e.g. "Harmonic Regression (Seasonal)"
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Every tier tried, in order, ending with the selected one
    pub fn trail(&self) -> &[TierAttempt] {
        &self.trail
    }

    /// True when a higher tier was tried and failed
    pub fn is_fallback(&self) -> bool {
        self.trail
            .iter()
            .any(|a| a.outcome != AttemptOutcome::Succeeded)
    }

    /// Forecast for the requested horizon, produced during selection
    pub fn forecast(&self) -> &ModelForecast {
        &self.forecast
    }
}

/// Walks the tiers for one series
pub struct ModelSelector<'a> {
    config: &'a SelectionConfig,
    models: &'a TierModels,
    events: &'a dyn EventSink,
}

impl<'a> ModelSelector<'a> {
    pub fn new(config: &'a SelectionConfig, models: &'a TierModels, events: &'a dyn EventSink) -> Self {
        Self {
            config,
            models,
            events,
        }
    }

    /// Pick and fit a model for `values` (non-zero weekly totals, oldest
    /// first) and forecast `horizon` weeks with it.
    ///
    /// Always returns a choice; tier failures are recorded on the trail and
    /// reported through the event sink. A tier whose forecast cannot be
    /// produced counts as failed.
    pub fn select(&self, values: &[f64], horizon: usize) -> ModelChoice {
        let mut state = SelectionState::initial(values.len(), self.config);
        let mut trail = Vec::new();

        loop {
            let (tier, model) = match state {
                SelectionState::TrySeasonal => (ModelTier::Seasonal, &self.models.seasonal),
                SelectionState::TryTrend => (ModelTier::Trend, &self.models.trend),
                _ => break,
            };

            match self.fit_guarded(Arc::clone(model), values, horizon) {
                Ok((label, forecast)) => {
                    trail.push(TierAttempt {
                        tier,
                        outcome: AttemptOutcome::Succeeded,
                    });
                    return self.finish(tier, label, forecast, trail);
                }
                Err(err) => {
                    let outcome = if err.is_timeout() {
                        self.events.record(ForecastEvent::FitTimedOut {
                            tier,
                            budget: self.config.fit_timeout(),
                        });
                        AttemptOutcome::TimedOut
                    } else {
                        self.events.record(ForecastEvent::FitFailed {
                            tier,
                            reason: err.to_string(),
                        });
                        AttemptOutcome::Failed(err.to_string())
                    };
                    trail.push(TierAttempt { tier, outcome });
                    state = state.next(false);
                }
            }
        }

        let fell_back = !trail.is_empty();
        trail.push(TierAttempt {
            tier: ModelTier::Baseline,
            outcome: AttemptOutcome::Succeeded,
        });
        let baseline = self.models.baseline.fit(values);
        let forecast = baseline.forecast(horizon).unwrap_or_else(|err| {
            // Only reachable when the totals overflow to infinity
            self.events.record(ForecastEvent::FitFailed {
                tier: ModelTier::Baseline,
                reason: err.to_string(),
            });
            ModelForecast::flat(0.0, horizon)
        });
        let label = if fell_back {
            "Linear Baseline (Fallback)".to_string()
        } else {
            "Linear Baseline".to_string()
        };
        self.finish(ModelTier::Baseline, label, forecast, trail)
    }

    fn fit_guarded(
        &self,
        model: Arc<dyn ForecastModel>,
        values: &[f64],
        horizon: usize,
    ) -> FitResult<(String, ModelForecast)> {
        let owned = values.to_vec();
        run_with_deadline(self.config.fit_timeout(), move |ctx| {
            let trained = model.train(&owned, &ctx)?;
            ctx.check()?;
            let forecast = trained.forecast(horizon)?;
            Ok((trained.name(), forecast))
        })
    }

    fn finish(
        &self,
        tier: ModelTier,
        label: String,
        forecast: ModelForecast,
        trail: Vec<TierAttempt>,
    ) -> ModelChoice {
        self.events.record(ForecastEvent::TierSelected {
            tier,
            label: label.clone(),
        });
        ModelChoice {
            tier,
            label,
            forecast,
            trail,
        }
    }
}
