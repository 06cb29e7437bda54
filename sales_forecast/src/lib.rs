//! # Sales Forecast
//!
//! Adaptive weekly sales forecasting for retail transaction data.
//!
//! ## Features
//!
//! - Transaction loading from CSV files or Polars DataFrames
//! - Weekly aggregation with zero-filled gaps
//! - Z-score anomaly capping that never alters reported history
//! - Tiered model selection by history length: harmonic regression
//!   (seasonal), ARIMA with drift (trend) and a linear baseline
//! - Bounded-time fitting with automatic fallback to a lower tier
//! - Walk-forward backtest with MAPE, RMSE and R² plus a confidence label
//! - Memoisation keyed by dataset identity and horizon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::data::TransactionLoader;
//! use sales_forecast::pipeline::ForecastPipeline;
//! use sales_forecast::config::ForecastConfig;
//!
//! # fn main() -> sales_forecast::Result<()> {
//! let input = TransactionLoader::from_csv("sales.csv", "upload-42", "order_date", "amount")?;
//! let pipeline = ForecastPipeline::new(ForecastConfig::default())?;
//!
//! let result = pipeline.generate_forecast(&input, 4)?;
//! println!("{} -> total {:.2} ({})", result.model_used, result.total, result.accuracy.confidence);
//! # Ok(())
//! # }
//! ```

pub mod anomaly;
pub mod backtest;
pub mod cache;
pub mod confidence;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod guard;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod selector;
pub mod series;
pub mod synthetic;
pub mod utils;

// Re-export commonly used types
pub use crate::cache::{ForecastCache, ForecastKey, MemoryForecastCache};
pub use crate::confidence::{AccuracyMetrics, Confidence};
pub use crate::config::ForecastConfig;
pub use crate::data::{FilteredTransactions, Horizon, Transaction, TransactionLoader};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{ForecastModel, ModelTier, TrainedForecastModel};
pub use crate::pipeline::{generate_forecast, ForecastPipeline, ForecastPoint, ForecastResult};
pub use crate::series::{WeeklyPoint, WeeklySeries};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
