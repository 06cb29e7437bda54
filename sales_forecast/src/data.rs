//! Transaction data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// A single sale (or return) with its resolved date and value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub value: f64,
}

impl Transaction {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Date-filtered, column-normalised transactions for one dataset.
///
/// `dataset_id` identifies the upload the rows came from; it is part of the
/// forecast cache key, so a new upload must carry a new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredTransactions {
    dataset_id: String,
    rows: Vec<Transaction>,
}

impl FilteredTransactions {
    pub fn new(dataset_id: impl Into<String>, rows: Vec<Transaction>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            rows,
        }
    }

    /// Identity of the dataset these rows were drawn from
    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest transaction date
    pub fn min_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|t| t.date).min()
    }

    /// Latest transaction date
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|t| t.date).max()
    }

    /// Days between the first and last transaction
    pub fn span_days(&self) -> Option<i64> {
        match (self.min_date(), self.max_date()) {
            (Some(min), Some(max)) => Some((max - min).num_days()),
            _ => None,
        }
    }

    /// Keep only rows inside the inclusive date range.
    ///
    /// The dataset id is extended with the range so cached forecasts of the
    /// unfiltered data are never reused for the filtered view.
    pub fn filter_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|t| start.map_or(true, |s| t.date >= s))
            .filter(|t| end.map_or(true, |e| t.date <= e))
            .copied()
            .collect();

        let bound = |d: Option<NaiveDate>| d.map_or_else(|| "*".to_string(), |d| d.to_string());
        Self {
            dataset_id: format!("{}[{}..{}]", self.dataset_id, bound(start), bound(end)),
            rows,
        }
    }
}

/// Caller-side guard: the data must span at least `horizon` weeks.
///
/// The core itself degrades gracefully on marginal data; this check exists
/// for the API layer, which rejects such requests up front.
pub fn check_minimum_span(input: &FilteredTransactions, horizon: usize) -> Result<()> {
    let required = horizon as i64 * 7;
    match input.span_days() {
        None => Err(ForecastError::InsufficientData {
            reason: "no transactions in the selected range".to_string(),
            span_days: None,
            required_days: Some(required),
        }),
        Some(span) if span < required => Err(ForecastError::InsufficientData {
            reason: format!("a {} week forecast needs more history", horizon),
            span_days: Some(span),
            required_days: Some(required),
        }),
        Some(_) => Ok(()),
    }
}

/// Forecast horizons the dashboard offers, in weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    TwoWeeks,
    FourWeeks,
    EightWeeks,
    TwelveWeeks,
}

impl Horizon {
    /// Map a requested week count to a supported horizon, defaulting to four weeks
    pub fn from_request(weeks: Option<u32>) -> Self {
        match weeks {
            Some(2) => Horizon::TwoWeeks,
            Some(8) => Horizon::EightWeeks,
            Some(12) => Horizon::TwelveWeeks,
            _ => Horizon::FourWeeks,
        }
    }

    pub fn weeks(self) -> usize {
        match self {
            Horizon::TwoWeeks => 2,
            Horizon::FourWeeks => 4,
            Horizon::EightWeeks => 8,
            Horizon::TwelveWeeks => 12,
        }
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon::FourWeeks
    }
}

/// Date formats accepted in text date columns, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Parse a date from the text formats commonly found in sales exports
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

/// Loads transactions from tabular sources once columns are known.
///
/// Column detection is the ingestion layer's job; callers pass the
/// resolved date and value column names.
#[derive(Debug)]
pub struct TransactionLoader;

impl TransactionLoader {
    /// Load transactions from a CSV file
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        dataset_id: &str,
        date_column: &str,
        value_column: &str,
    ) -> Result<FilteredTransactions> {
        let file = File::open(path)?;
        // Use polars DataFrame reader directly
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df, dataset_id, date_column, value_column)
    }

    /// Create transactions from an existing DataFrame.
    ///
    /// Rows with a missing date or value are skipped.
    pub fn from_dataframe(
        df: &DataFrame,
        dataset_id: &str,
        date_column: &str,
        value_column: &str,
    ) -> Result<FilteredTransactions> {
        let dates = Self::column_as_dates(df, date_column)?;
        let values = Self::column_as_f64(df, value_column)?;

        let rows = dates
            .into_iter()
            .zip(values)
            .filter_map(|(date, value)| match (date, value) {
                (Some(date), Some(value)) if value.is_finite() => {
                    Some(Transaction::new(date, value))
                }
                _ => None,
            })
            .collect();

        Ok(FilteredTransactions::new(dataset_id, rows))
    }

    /// Helper method to get a column as calendar dates
    fn column_as_dates(df: &DataFrame, column_name: &str) -> Result<Vec<Option<NaiveDate>>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .ok_or_else(|| ForecastError::DataError("invalid epoch".to_string()))?;

        match col.dtype() {
            DataType::Date => Ok(col
                .date()?
                .into_iter()
                .map(|opt_days| {
                    opt_days.and_then(|days| {
                        if days >= 0 {
                            epoch.checked_add_days(Days::new(days as u64))
                        } else {
                            epoch.checked_sub_days(Days::new(days.unsigned_abs() as u64))
                        }
                    })
                })
                .collect()),
            DataType::Datetime(unit, _) => {
                let per_second: i64 = match unit {
                    TimeUnit::Nanoseconds => 1_000_000_000,
                    TimeUnit::Microseconds => 1_000_000,
                    TimeUnit::Milliseconds => 1_000,
                };
                Ok(col
                    .datetime()?
                    .into_iter()
                    .map(|opt_ts| {
                        opt_ts.and_then(|ts| {
                            chrono::DateTime::from_timestamp(ts.div_euclid(per_second), 0)
                                .map(|dt| dt.date_naive())
                        })
                    })
                    .collect())
            }
            DataType::Utf8 => {
                let text = col.utf8()?;
                let mut dates = Vec::with_capacity(text.len());
                for raw in text.into_iter() {
                    match raw {
                        Some(raw) => {
                            let date = parse_date(raw).ok_or_else(|| {
                                ForecastError::DataError(format!(
                                    "Unrecognised date '{}' in column '{}'",
                                    raw, column_name
                                ))
                            })?;
                            dates.push(Some(date));
                        }
                        None => dates.push(None),
                    }
                }
                Ok(dates)
            }
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to dates",
                column_name
            ))),
        }
    }

    /// Helper method to get a column as f64 values
    fn column_as_f64(df: &DataFrame, column_name: &str) -> Result<Vec<Option<f64>>> {
        let col = df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        match col.dtype() {
            DataType::Float64 => Ok(col.f64()?.into_iter().collect()),
            DataType::Float32 => Ok(col
                .f32()?
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect()),
            DataType::Int64 => Ok(col
                .i64()?
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect()),
            DataType::Int32 => Ok(col
                .i32()?
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect()),
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                column_name
            ))),
        }
    }
}
