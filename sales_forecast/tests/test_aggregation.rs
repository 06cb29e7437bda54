use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sales_forecast::anomaly::AnomalyDetector;
use sales_forecast::config::{AnomalyConfig, ForecastConfig, NegativeValuePolicy};
use sales_forecast::series::WeeklySeries;
use sales_forecast::synthetic::{seasonal_weekly, with_spike};
use sales_forecast::Transaction;
use std::io::Write;
use tempfile::NamedTempFile;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_weeks_cross_year_boundary() {
    // 2024-12-30 is a Monday; 2025-01-02 falls in the same ISO week
    let rows = vec![
        Transaction::new(day(2024, 12, 24), 10.0),
        Transaction::new(day(2024, 12, 30), 5.0),
        Transaction::new(day(2025, 1, 2), 7.0),
    ];
    let series = WeeklySeries::from_transactions(&rows, NegativeValuePolicy::Keep);

    assert_eq!(series.values(), vec![10.0, 12.0]);
    assert_eq!(series.points()[1].week_start, day(2024, 12, 30));
}

#[test]
fn test_gaps_are_zero_filled() {
    let rows = vec![
        Transaction::new(day(2024, 3, 4), 1.0),
        Transaction::new(day(2024, 4, 1), 2.0),
    ];
    let series = WeeklySeries::from_transactions(&rows, NegativeValuePolicy::Keep);

    assert_eq!(series.values(), vec![1.0, 0.0, 0.0, 0.0, 2.0]);
    let weeks: Vec<NaiveDate> = series.points().iter().map(|p| p.week_start).collect();
    assert!(weeks.windows(2).all(|w| (w[1] - w[0]).num_days() == 7));
}

#[rstest]
#[case(10, 5.0)]
#[case(50, 8.0)]
#[case(90, 20.0)]
fn test_single_spike_is_flagged(#[case] index: usize, #[case] factor: f64) {
    let values = with_spike(&seasonal_weekly(104, 10.0, 5), index, factor);
    let series = WeeklySeries::from_values(day(2022, 1, 3), &values);

    let report = AnomalyDetector::default().detect(&series);

    assert_eq!(report.flagged_indices(), vec![index]);
    // The series itself is untouched
    assert_eq!(series.values()[index], values[index]);
    assert!(report.capped[index] < values[index]);
}

#[test]
fn test_threshold_is_configurable() {
    // Alternating 90/110 with a moderate bump to 135 (z is about 2.9)
    let mut values: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 90.0 } else { 110.0 }).collect();
    values[5] = 135.0;
    let series = WeeklySeries::from_values(day(2024, 1, 1), &values);

    assert!(!AnomalyDetector::default().detect(&series).has_anomalies());

    let strict = AnomalyDetector::new(AnomalyConfig {
        zscore_threshold: 2.0,
        ..AnomalyConfig::default()
    });
    assert_eq!(strict.detect(&series).flagged_indices(), vec![5]);
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"anomaly": {{"zscore_threshold": 2.5}}, "aggregation": {{"negative_values": "drop"}}}}"#
    )
    .unwrap();

    let config = ForecastConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.anomaly.zscore_threshold, 2.5);
    assert_eq!(config.aggregation.negative_values, NegativeValuePolicy::Drop);
    assert_eq!(config.selection.seasonal_min_weeks, 52);
}
