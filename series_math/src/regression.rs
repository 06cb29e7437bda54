//! Least-squares fitting over a week index
//!
//! Contains:
//! - Linear Regression of values against their position
//! - Ordinary least squares over an arbitrary design matrix
//! - A dense linear solver used by both

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Linear Regression of a series against its index (0, 1, 2, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    slope: f64,
    intercept: f64,
    observations: usize,
    residual_std: f64,
}

impl LinearRegression {
    /// Fit a line through the values, using each value's position as x.
    ///
    /// A single observation yields a flat line through that value.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Need at least 1 point for linear regression".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Linear regression requires finite values".to_string(),
            ));
        }

        let n = values.len() as f64;

        // Calculate means
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        // Calculate the slope (m)
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for (i, &y) in values.iter().enumerate() {
            let x = i as f64;
            numerator += (x - x_mean) * (y - y_mean);
            denominator += (x - x_mean) * (x - x_mean);
        }

        let slope = if denominator.abs() < 1e-10 {
            0.0
        } else {
            numerator / denominator
        };

        // Calculate the intercept (b)
        let intercept = y_mean - slope * x_mean;

        let residual_ss: f64 = values
            .iter()
            .enumerate()
            .map(|(i, &y)| (y - (slope * i as f64 + intercept)).powi(2))
            .sum();
        let dof = values.len().saturating_sub(2).max(1) as f64;

        Ok(Self {
            slope,
            intercept,
            observations: values.len(),
            residual_std: (residual_ss / dof).sqrt(),
        })
    }

    /// Horizontal line at `level`, as if fitted on `observations` points
    pub fn flat(level: f64, observations: usize) -> Self {
        Self {
            slope: 0.0,
            intercept: level,
            observations,
            residual_std: 0.0,
        }
    }

    /// Value of the fitted line at position `x`
    pub fn predict_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Predict the value n periods after the last observation
    pub fn forecast(&self, periods_ahead: usize) -> f64 {
        let x = (self.observations + periods_ahead - 1) as f64;
        self.predict_at(x)
    }

    /// Get the slope (trend direction and strength)
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Get the intercept
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Number of observations the line was fitted on
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Standard deviation of the in-sample residuals
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }
}

/// Ordinary least squares: find `beta` minimising `|X beta - y|^2`.
///
/// `design` holds one row per observation; every row must have the same width.
pub fn least_squares(design: &[Vec<f64>], targets: &[f64]) -> Result<Vec<f64>> {
    if design.len() != targets.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but there are {} targets",
            design.len(),
            targets.len()
        )));
    }

    let width = design.first().map(Vec::len).unwrap_or(0);
    if width == 0 {
        return Err(MathError::InvalidInput(
            "Design matrix has no columns".to_string(),
        ));
    }
    if design.len() < width {
        return Err(MathError::InsufficientData(format!(
            "Need at least {} observations for {} coefficients, got {}",
            width,
            width,
            design.len()
        )));
    }

    // Normal equations: (X'X) beta = X'y
    let mut xtx = vec![vec![0.0; width]; width];
    let mut xty = vec![0.0; width];

    for (row, &y) in design.iter().zip(targets) {
        if row.len() != width {
            return Err(MathError::InvalidInput(
                "Design matrix rows differ in width".to_string(),
            ));
        }
        for i in 0..width {
            xty[i] += row[i] * y;
            for j in i..width {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..width {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    solve_linear_system(xtx, xty)
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Linear system must be square and match the right-hand side".to_string(),
        ));
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < 1e-12 * scale {
            return Err(MathError::CalculationError(
                "Linear system is singular".to_string(),
            ));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Linear system produced non-finite coefficients".to_string(),
        ));
    }

    Ok(x)
}
