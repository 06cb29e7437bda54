use sales_forecast::cache::MemoryForecastCache;
use sales_forecast::synthetic::{seasonal_weekly, sparse_weekly, to_transactions, trending_weekly};
use sales_forecast::{ForecastConfig, ForecastPipeline, Horizon};
use chrono::NaiveDate;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=sales_forecast=debug shows fallback and cache events
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };
    let pipeline = ForecastPipeline::new(config)?;
    let cache = MemoryForecastCache::new(&pipeline.config().cache);

    let first_week = NaiveDate::from_ymd_opt(2023, 1, 2).ok_or("invalid start date")?;
    let datasets = vec![
        ("two-years-seasonal", seasonal_weekly(104, 20.0, 42)),
        ("thirty-weeks-trend", trending_weekly(30, 800.0, 25.0, 0.2, 7)),
        ("ten-weeks-sparse", sparse_weekly(10, 200.0, 3, 5)),
    ];

    for (name, values) in datasets {
        let input = to_transactions(name, first_week, &values);
        let result = pipeline.generate_cached(&cache, &input, Horizon::EightWeeks.weeks())?;

        println!("\n{} ({} weeks of history)", name, result.historical.len());
        println!("  Model:      {}", result.model_used);
        println!(
            "  Confidence: {} (MAPE {})",
            result.accuracy.confidence,
            result
                .accuracy
                .mape
                .map_or_else(|| "n/a".to_string(), |m| format!("{:.2}%", m))
        );
        for point in &result.forecast {
            println!(
                "  {}  {:>10.2}  [{:.2}, {:.2}]",
                point.week_label, point.point, point.lower, point.upper
            );
        }
        println!("  Total:      {:.2}", result.total);
    }

    // Served from cache
    let input = to_transactions("ten-weeks-sparse", first_week, &sparse_weekly(10, 200.0, 3, 5));
    let again = pipeline.generate_cached(&cache, &input, Horizon::EightWeeks.weeks())?;
    println!("\nCached digest: {}", again.digest()?);

    Ok(())
}
