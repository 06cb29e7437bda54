//! Descriptive statistics over plain value slices.

use crate::{MathError, Result};

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
///
/// A single observation has no spread, so it yields `0.0` rather than an error.
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    let avg = mean(values)?;
    if values.len() < 2 {
        return Ok(0.0);
    }

    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Median of the values; the mean of the two middle values for even lengths
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the median of an empty series".to_string(),
        ));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(MathError::InvalidInput(
            "Median is undefined for NaN values".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Z-score of every value against the given mean and standard deviation.
///
/// Returns all zeros when the deviation is zero or not finite.
pub fn z_scores(values: &[f64], center: f64, std_dev: f64) -> Vec<f64> {
    if !std_dev.is_finite() || std_dev <= f64::EPSILON {
        return vec![0.0; values.len()];
    }

    values.iter().map(|v| (v - center) / std_dev).collect()
}
