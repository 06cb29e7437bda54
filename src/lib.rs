//! # Retail Forecast
//!
//! Umbrella crate for the weekly sales forecasting engine.
//!
//! - [`sales_forecast`]: aggregation, model selection, backtesting, caching
//! - [`series_math`]: the numeric kernels underneath
//!
//! ## Example
//!
//! ```
//! use retail_forecast_workspace::sales_forecast::synthetic::{sparse_weekly, to_transactions};
//! use retail_forecast_workspace::sales_forecast::{generate_forecast, Confidence, ModelTier};
//! use chrono::NaiveDate;
//!
//! let first_week = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let input = to_transactions("demo", first_week, &sparse_weekly(10, 200.0, 3, 1));
//!
//! let result = generate_forecast(&input, 2).unwrap();
//! assert_eq!(result.tier, ModelTier::Baseline);
//! assert_eq!(result.forecast.len(), 2);
//! assert_eq!(result.accuracy.confidence, Confidence::Low);
//! ```

pub use sales_forecast;
pub use series_math;

/// Version of the workspace crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
