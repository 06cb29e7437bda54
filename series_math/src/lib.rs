//! # Series Math
//!
//! Numeric kernels shared by the sales forecasting engine.
//! This crate provides descriptive statistics, outlier scores and
//! least-squares fitting over weekly value series. It does no I/O.

use thiserror::Error;

pub mod regression;
pub mod stats;

pub use regression::{least_squares, solve_linear_system, LinearRegression};
pub use stats::{mean, median, sample_std_dev, z_scores};

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
