//! Walk-forward backtest of the selected tier
//!
//! The model is refitted on an expanding window and asked for one step
//! ahead at every origin; the predictions are scored against the true
//! (uncapped) weekly totals. Refits share one deadline and each runs on a
//! guarded worker with whatever budget is left: once it passes, the
//! remaining origins are abandoned and only completed steps count.

use crate::config::{BacktestConfig, SelectionConfig};
use crate::error::FitResult;
use crate::events::{EventSink, ForecastEvent};
use crate::guard::run_with_deadline;
use crate::metrics::{forecast_accuracy, ForecastAccuracy};
use crate::models::{ForecastModel, ModelForecast, ModelTier, TierModels};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Smallest training window for a tier given `n` observations
pub fn min_training_window(
    tier: ModelTier,
    n: usize,
    selection: &SelectionConfig,
    config: &BacktestConfig,
) -> usize {
    match tier {
        ModelTier::Seasonal => selection.seasonal_min_weeks,
        ModelTier::Trend => selection.trend_min_weeks,
        ModelTier::Baseline => config.baseline_min_train.max(n / 2),
    }
}

/// Rolling-origin evaluator
pub struct Backtester<'a> {
    selection: &'a SelectionConfig,
    config: &'a BacktestConfig,
    models: &'a TierModels,
    events: &'a dyn EventSink,
}

impl<'a> Backtester<'a> {
    pub fn new(
        selection: &'a SelectionConfig,
        config: &'a BacktestConfig,
        models: &'a TierModels,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            selection,
            config,
            models,
            events,
        }
    }

    /// Score `tier` on `actuals` (non-zero weekly totals, oldest first).
    ///
    /// Returns `None` when fewer than `min_steps` predictions could be made.
    pub fn run(&self, tier: ModelTier, actuals: &[f64]) -> Option<ForecastAccuracy> {
        let n = actuals.len();
        let min_train = min_training_window(tier, n, self.selection, self.config);
        let mut first_origin = min_train;
        if let Some(max_steps) = self.config.max_steps {
            first_origin = first_origin.max(n.saturating_sub(max_steps));
        }

        let available = n.saturating_sub(first_origin);
        if available < self.config.min_steps {
            self.skip(tier, available);
            return None;
        }

        let model: Arc<dyn ForecastModel> = match tier {
            ModelTier::Seasonal => Arc::clone(&self.models.seasonal),
            ModelTier::Trend => Arc::clone(&self.models.trend),
            ModelTier::Baseline => Arc::new(self.models.baseline.clone()),
        };
        let deadline = Instant::now() + self.selection.fit_timeout();

        let mut predicted = Vec::with_capacity(available);
        let mut observed = Vec::with_capacity(available);

        for origin in first_origin..n {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let step = refit(Arc::clone(&model), &actuals[..origin], remaining);

            match step {
                Ok(forecast) => {
                    if let Some(&value) = forecast.values().first() {
                        predicted.push(value);
                        observed.push(actuals[origin]);
                    }
                }
                Err(err) => {
                    let out_of_time = err.is_timeout();
                    self.events.record(ForecastEvent::BacktestStepFailed {
                        tier,
                        origin,
                        reason: err.to_string(),
                    });
                    if out_of_time {
                        break;
                    }
                }
            }
        }

        if predicted.len() < self.config.min_steps {
            self.skip(tier, predicted.len());
            return None;
        }

        forecast_accuracy(&predicted, &observed).ok()
    }

    fn skip(&self, tier: ModelTier, available_steps: usize) {
        self.events.record(ForecastEvent::BacktestSkipped {
            tier,
            available_steps,
            required_steps: self.config.min_steps,
        });
    }
}

/// One-step-ahead forecast from a model trained on `window`
fn refit(model: Arc<dyn ForecastModel>, window: &[f64], budget: Duration) -> FitResult<ModelForecast> {
    let window = window.to_vec();
    run_with_deadline(budget, move |ctx| {
        let trained = model.train(&window, &ctx)?;
        ctx.check()?;
        trained.forecast(1)
    })
}
