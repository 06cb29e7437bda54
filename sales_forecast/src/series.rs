//! Weekly aggregation of transactions
//!
//! Collapses raw rows into one total per ISO week (weeks start on Monday),
//! filling weeks without sales with zero so the series is regular.

use crate::config::NegativeValuePolicy;
use crate::data::Transaction;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total sales for one calendar week
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPoint {
    /// Monday of the ISO week
    pub week_start: NaiveDate,
    pub value: f64,
}

/// A regular weekly series with strictly increasing, gap-free weeks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklySeries {
    points: Vec<WeeklyPoint>,
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

impl WeeklySeries {
    /// Aggregate transactions into weekly totals.
    ///
    /// Empty input gives an empty series; the pipeline turns that into an
    /// insufficient-data error.
    pub fn from_transactions(rows: &[Transaction], policy: NegativeValuePolicy) -> Self {
        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for row in rows {
            let value = match policy {
                NegativeValuePolicy::Keep => row.value,
                NegativeValuePolicy::Absolute => row.value.abs(),
                NegativeValuePolicy::Drop if row.value < 0.0 => continue,
                NegativeValuePolicy::Drop => row.value,
            };
            *buckets.entry(week_start(row.date)).or_insert(0.0) += value;
        }

        let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Self::default(),
        };

        let mut points = Vec::with_capacity(((last - first).num_weeks() + 1) as usize);
        let mut current = first;
        while current <= last {
            points.push(WeeklyPoint {
                week_start: current,
                value: buckets.get(&current).copied().unwrap_or(0.0),
            });
            current += Duration::weeks(1);
        }

        Self { points }
    }

    /// Build a series from consecutive weekly values starting at `first_week`
    pub fn from_values(first_week: NaiveDate, values: &[f64]) -> Self {
        let start = week_start(first_week);
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &value)| WeeklyPoint {
                week_start: start + Duration::weeks(i as i64),
                value,
            })
            .collect();

        Self { points }
    }

    pub fn points(&self) -> &[WeeklyPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Monday of the last week in the series
    pub fn last_week(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.week_start)
    }

    /// Indices of weeks that recorded any sales
    pub fn non_zero_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.value != 0.0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of weeks that recorded any sales
    pub fn non_zero_count(&self) -> usize {
        self.points.iter().filter(|p| p.value != 0.0).count()
    }

    /// Percentage of weeks with no sales at all
    pub fn sparsity_pct(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let zeros = self.points.len() - self.non_zero_count();
        zeros as f64 / self.points.len() as f64 * 100.0
    }

    /// The last `n` weeks that recorded sales, oldest first
    pub fn recent_non_zero(&self, n: usize) -> Vec<WeeklyPoint> {
        let mut recent: Vec<WeeklyPoint> = self
            .points
            .iter()
            .rev()
            .filter(|p| p.value != 0.0)
            .take(n)
            .copied()
            .collect();
        recent.reverse();
        recent
    }
}
