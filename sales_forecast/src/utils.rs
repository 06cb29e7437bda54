//! Utility functions for the sales_forecast crate

use chrono::{Datelike, Duration, NaiveDate};

/// Week starts for the `horizon` weeks following `last_week`
pub fn future_week_starts(last_week: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64)
        .map(|step| last_week + Duration::weeks(step))
        .collect()
}

/// Short display label for a week, e.g. "06 Jan"
pub fn week_label(week_start: NaiveDate) -> String {
    week_start.format("%d %b").to_string()
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Whether `date` falls inside the inclusive `(month, day)` window
pub fn date_in_window(date: NaiveDate, start: (u32, u32), end: (u32, u32)) -> bool {
    let key = (date.month(), date.day());
    start <= key && key <= end
}
