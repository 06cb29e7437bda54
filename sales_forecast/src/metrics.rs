//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Calculate accuracy metrics for one-step predictions vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    Ok(ForecastAccuracy {
        mape: mape(forecast, actual),
        rmse: rmse(forecast, actual),
        r_squared: r_squared(forecast, actual),
        steps: forecast.len(),
    })
}

/// Mean Absolute Percentage Error over the steps with a non-zero actual.
///
/// `None` when every actual is zero.
pub fn mape(forecast: &[f64], actual: &[f64]) -> Option<f64> {
    let terms: Vec<f64> = forecast
        .iter()
        .zip(actual)
        .filter(|(_, &a)| a != 0.0)
        .map(|(&f, &a)| ((a - f) / a).abs() * 100.0)
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.iter().sum::<f64>() / terms.len() as f64)
    }
}

/// Root Mean Squared Error
pub fn rmse(forecast: &[f64], actual: &[f64]) -> f64 {
    if forecast.is_empty() {
        return 0.0;
    }
    let mse = forecast
        .iter()
        .zip(actual)
        .map(|(&f, &a)| (a - f).powi(2))
        .sum::<f64>()
        / forecast.len() as f64;
    mse.sqrt()
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// A constant actual series has no variance to explain and scores 0.
pub fn r_squared(forecast: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = forecast
        .iter()
        .zip(actual)
        .map(|(&f, &a)| (a - f).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Percentage Error
    pub mape: Option<f64>,
    /// Root Mean Squared Error
    pub rmse: f64,
    pub r_squared: f64,
    /// Number of predictions scored
    pub steps: usize,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics ({} steps):", self.steps)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE:  {:.4}%", mape)?,
            None => writeln!(f, "  MAPE:  n/a")?,
        }
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  R2:    {:.4}", self.r_squared)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_forecast() {
        let actual = [10.0, 20.0, 30.0];
        let accuracy = forecast_accuracy(&actual, &actual).unwrap();
        assert_eq!(accuracy.mape, Some(0.0));
        assert_eq!(accuracy.rmse, 0.0);
        assert_eq!(accuracy.r_squared, 1.0);
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let forecast = [110.0, 5.0, 90.0];
        let actual = [100.0, 0.0, 100.0];
        let value = mape(&forecast, &actual).unwrap();
        assert!((value - 10.0).abs() < 1e-12);
        assert_eq!(mape(&[1.0], &[0.0]), None);
    }

    #[test]
    fn test_rmse_over_all_steps() {
        let value = rmse(&[1.0, 5.0], &[4.0, 1.0]);
        assert!((value - (12.5_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_constant_actuals_is_zero() {
        assert_eq!(r_squared(&[1.0, 2.0], &[5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_r_squared_can_be_negative() {
        assert!(r_squared(&[30.0, 10.0], &[10.0, 30.0]) < 0.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(forecast_accuracy(&[1.0], &[1.0, 2.0]).is_err());
        assert!(forecast_accuracy(&[], &[]).is_err());
    }
}
