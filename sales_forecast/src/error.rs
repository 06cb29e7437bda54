//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use series_math::MathError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of the forecasting core
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough history to produce any forecast
    #[error("Insufficient data: {reason}{}", span_detail(.span_days, .required_days))]
    InsufficientData {
        reason: String,
        /// Days between the first and last transaction, when known
        span_days: Option<i64>,
        /// Days the caller needed for the requested horizon, when known
        required_days: Option<i64>,
    },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from an inconsistent configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Error from the numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

impl ForecastError {
    /// Shorthand for an insufficient-data error without span details
    pub fn insufficient(reason: impl Into<String>) -> Self {
        ForecastError::InsufficientData {
            reason: reason.into(),
            span_days: None,
            required_days: None,
        }
    }

    /// Whether this error means the input could not support a forecast
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ForecastError::InsufficientData { .. })
    }
}

fn span_detail(span_days: &Option<i64>, required_days: &Option<i64>) -> String {
    match (span_days, required_days) {
        (Some(actual), Some(required)) => {
            format!(" (have {} days, need {} days)", actual, required)
        }
        (Some(actual), None) => format!(" (have {} days)", actual),
        _ => String::new(),
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

/// Why a single model tier could not produce a fit.
///
/// These never reach callers: the selector absorbs them and falls through
/// to the next tier.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FitError {
    #[error("need at least {needed} observations, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("model did not converge: {0}")]
    NonConvergence(String),

    #[error("fit exceeded the {0:?} time budget")]
    Timeout(Duration),

    #[error("fit deadline passed before the model finished")]
    DeadlineExceeded,

    #[error("fit worker panicked")]
    WorkerPanicked,

    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl FitError {
    /// Timeouts and cooperative deadline hits are treated the same way
    pub fn is_timeout(&self) -> bool {
        matches!(self, FitError::Timeout(_) | FitError::DeadlineExceeded)
    }
}

/// Result type for fitting a single tier
pub type FitResult<T> = std::result::Result<T, FitError>;
