//! Seeded synthetic sales histories
//!
//! Used by the demo and the test suites to produce repeatable series with
//! known shape: a yearly cycle, a noisy trend, sparse trading and spikes.

use crate::data::{FilteredTransactions, Transaction};
use crate::series::week_start;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use std::f64::consts::PI;

/// Draw Gaussian noise, or nothing for a non-positive spread
fn noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    match Normal::new(0.0, std_dev) {
        Ok(dist) if std_dev > 0.0 => rng.sample(dist),
        _ => 0.0,
    }
}

/// Trend plus one sine cycle per 52 weeks:
/// `1000 + 3t + 300 sin(2 pi t / 52) + N(0, noise_sd)`
pub fn seasonal_weekly(weeks: usize, noise_sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..weeks)
        .map(|t| {
            let t = t as f64;
            1000.0 + 3.0 * t + 300.0 * (2.0 * PI * t / 52.0).sin() + noise(&mut rng, noise_sd)
        })
        .collect()
}

/// Linear growth with multiplicative noise, floored at 10% of the level:
/// `level_t = start + slope * t`, `y_t = level_t * (1 + N(0, noise_pct))`
pub fn trending_weekly(weeks: usize, start: f64, slope: f64, noise_pct: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..weeks)
        .map(|t| {
            let level = start + slope * t as f64;
            (level * (1.0 + noise(&mut rng, noise_pct))).max(level * 0.1)
        })
        .collect()
}

/// A series where every `gap_every`-th week has no sales
pub fn sparse_weekly(weeks: usize, level: f64, gap_every: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..weeks)
        .map(|t| {
            if gap_every > 0 && (t + 1) % gap_every == 0 {
                0.0
            } else {
                (level + noise(&mut rng, level * 0.1)).max(1.0)
            }
        })
        .collect()
}

/// Copy of `values` with the week at `index` multiplied by `factor`
pub fn with_spike(values: &[f64], index: usize, factor: f64) -> Vec<f64> {
    let mut spiked = values.to_vec();
    if let Some(v) = spiked.get_mut(index) {
        *v *= factor;
    }
    spiked
}

/// One transaction per week carrying that week's total.
///
/// Weeks with a zero total get no transaction, so they reappear as gaps
/// once aggregated. The trading day moves within the week to exercise
/// weekly bucketing.
pub fn to_transactions(dataset_id: &str, first_week: NaiveDate, values: &[f64]) -> FilteredTransactions {
    let monday = week_start(first_week);
    let rows = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(i, &value)| {
            let date = monday + Duration::weeks(i as i64) + Duration::days((i % 5) as i64);
            Transaction::new(date, value)
        })
        .collect();

    FilteredTransactions::new(dataset_id, rows)
}
