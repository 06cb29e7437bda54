use assert_approx_eq::assert_approx_eq;
use rstest::rstest;
use sales_forecast::models::{
    ArimaModel, FitContext, ForecastModel, HarmonicRegression, LinearBaseline, ModelForecast,
    ModelTier, TierModels,
};
use sales_forecast::synthetic::{seasonal_weekly, sparse_weekly, trending_weekly};

fn assert_well_formed(forecast: &ModelForecast, horizon: usize) {
    assert_eq!(forecast.horizons(), horizon);
    for (value, (lower, upper)) in forecast.values().iter().zip(forecast.intervals()) {
        assert!(*lower >= 0.0, "negative lower bound {}", lower);
        assert!(lower <= value && value <= upper, "{} <= {} <= {}", lower, value, upper);
    }
}

#[rstest]
#[case(2)]
#[case(4)]
#[case(8)]
#[case(12)]
fn test_harmonic_regression_horizons(#[case] horizon: usize) {
    let values = seasonal_weekly(104, 15.0, 42);
    let trained = HarmonicRegression::new(52, 3, 0.85)
        .train(&values, &FitContext::unbounded())
        .unwrap();

    let forecast = trained.forecast(horizon).unwrap();
    assert_well_formed(&forecast, horizon);
    assert!(trained.name().contains("Seasonal"));
}

#[test]
fn test_harmonic_regression_tracks_cycle() {
    let values = seasonal_weekly(156, 10.0, 1);
    let trained = HarmonicRegression::new(52, 3, 0.85)
        .train(&values[..104], &FitContext::unbounded())
        .unwrap();

    let forecast = trained.forecast(8).unwrap();
    for (step, predicted) in forecast.values().iter().enumerate() {
        // Well within a few noise standard deviations
        assert_approx_eq!(*predicted, values[104 + step], 60.0);
    }
}

#[rstest]
#[case(2)]
#[case(4)]
#[case(12)]
fn test_arima_horizons(#[case] horizon: usize) {
    let values = trending_weekly(30, 800.0, 25.0, 0.2, 7);
    let trained = ArimaModel::new(3, 0.85)
        .train(&values, &FitContext::unbounded())
        .unwrap();

    let forecast = trained.forecast(horizon).unwrap();
    assert_well_formed(&forecast, horizon);
    assert!(trained.name().contains("Trend"));
}

#[test]
fn test_arima_follows_drift() {
    let values: Vec<f64> = (0..24)
        .map(|t| 300.0 + 12.0 * t as f64 + if t % 2 == 0 { 3.0 } else { -3.0 })
        .collect();
    let trained = ArimaModel::new(3, 0.85)
        .train(&values, &FitContext::unbounded())
        .unwrap();

    let forecast = trained.forecast(4).unwrap();
    let last = values[values.len() - 1];
    assert!(forecast.values()[3] > last);
}

#[test]
fn test_baseline_on_sparse_values() {
    let values: Vec<f64> = sparse_weekly(10, 200.0, 3, 9)
        .into_iter()
        .filter(|v| *v != 0.0)
        .collect();
    let trained = LinearBaseline::default()
        .train(&values, &FitContext::unbounded())
        .unwrap();

    assert_well_formed(&trained.forecast(2).unwrap(), 2);
    assert_eq!(trained.name(), "Linear Baseline");
}

#[test]
fn test_tier_models_defaults() {
    let models = TierModels::default();
    assert_eq!(models.seasonal.tier(), ModelTier::Seasonal);
    assert_eq!(models.trend.tier(), ModelTier::Trend);
    assert_eq!(models.baseline.tier(), ModelTier::Baseline);
}

#[test]
fn test_model_tier_display() {
    assert_eq!(ModelTier::Seasonal.to_string(), "seasonal");
    assert_eq!(ModelTier::Trend.to_string(), "trend");
    assert_eq!(ModelTier::Baseline.to_string(), "baseline");
}
