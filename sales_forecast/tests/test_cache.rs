mod common;

use common::{sparse_input, trending_input};
use pretty_assertions::assert_eq;
use sales_forecast::cache::{ForecastCache, ForecastKey, MemoryForecastCache};
use sales_forecast::config::{CacheConfig, ForecastConfig};
use sales_forecast::events::{ForecastEvent, RecordingEventSink};
use sales_forecast::pipeline::ForecastPipeline;
use sales_forecast::FilteredTransactions;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn pipeline_with_sink() -> (ForecastPipeline, Arc<RecordingEventSink>) {
    let sink = Arc::new(RecordingEventSink::new());
    let pipeline = ForecastPipeline::new(ForecastConfig::default())
        .unwrap()
        .with_event_sink(sink.clone());
    (pipeline, sink)
}

fn cache_events(sink: &RecordingEventSink) -> Vec<ForecastEvent> {
    sink.events()
        .into_iter()
        .filter(|e| matches!(e, ForecastEvent::CacheHit { .. } | ForecastEvent::CacheMiss { .. }))
        .collect()
}

#[test]
fn test_second_request_is_served_from_cache() {
    let (pipeline, sink) = pipeline_with_sink();
    let cache = MemoryForecastCache::default();
    let input = sparse_input();

    let first = pipeline.generate_cached(&cache, &input, 2).unwrap();
    let second = pipeline.generate_cached(&cache, &input, 2).unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);

    let key = ForecastKey::for_input(&input, 2).to_string();
    assert_eq!(
        cache_events(&sink),
        vec![
            ForecastEvent::CacheMiss { key: key.clone() },
            ForecastEvent::CacheHit { key },
        ]
    );
}

#[test]
fn test_cached_equals_uncached() {
    let (pipeline, _) = pipeline_with_sink();
    let cache = MemoryForecastCache::default();
    let input = trending_input();

    let cached = pipeline.generate_cached(&cache, &input, 4).unwrap();
    let direct = pipeline.generate_forecast(&input, 4).unwrap();
    assert_eq!(cached, direct);
}

#[test]
fn test_new_dataset_is_not_served_stale() {
    let (pipeline, sink) = pipeline_with_sink();
    let cache = MemoryForecastCache::default();
    let original = sparse_input();
    // Same rows re-uploaded under a new identity
    let reupload = FilteredTransactions::new("sparse-v2", original.rows().to_vec());

    pipeline.generate_cached(&cache, &original, 2).unwrap();
    pipeline.generate_cached(&cache, &reupload, 2).unwrap();

    assert_eq!(cache.len(), 2);
    assert!(cache_events(&sink)
        .iter()
        .all(|e| matches!(e, ForecastEvent::CacheMiss { .. })));
}

#[test]
fn test_horizon_is_part_of_the_key() {
    let (pipeline, _) = pipeline_with_sink();
    let cache = MemoryForecastCache::default();
    let input = trending_input();

    let short = pipeline.generate_cached(&cache, &input, 2).unwrap();
    let long = pipeline.generate_cached(&cache, &input, 8).unwrap();

    assert_eq!(short.forecast.len(), 2);
    assert_eq!(long.forecast.len(), 8);
}

#[test]
fn test_errors_are_not_cached() {
    let (pipeline, _) = pipeline_with_sink();
    let cache = MemoryForecastCache::default();
    let empty = FilteredTransactions::new("empty", Vec::new());

    assert!(pipeline.generate_cached(&cache, &empty, 4).is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_first_stored_value_wins() {
    let (pipeline, _) = pipeline_with_sink();
    let cache = MemoryForecastCache::default();
    let input = sparse_input();
    let key = ForecastKey::for_input(&input, 2);

    let first = pipeline.generate_forecast(&input, 2).unwrap();
    let mut other = first.clone();
    other.model_used = "something else".to_string();

    assert_eq!(cache.put(key.clone(), first.clone()), first);
    assert_eq!(cache.put(key.clone(), other), first);
    assert_eq!(cache.get(&key), Some(first));
}

#[test]
fn test_entries_expire() {
    let (pipeline, _) = pipeline_with_sink();
    let cache = MemoryForecastCache::new(&CacheConfig {
        max_entries: 8,
        ttl_secs: 1,
    });
    let input = sparse_input();
    let key = ForecastKey::for_input(&input, 2);

    cache.put(key.clone(), pipeline.generate_forecast(&input, 2).unwrap());
    assert!(cache.get(&key).is_some());

    thread::sleep(Duration::from_millis(1100));
    assert_eq!(cache.get(&key), None);
}

#[test]
fn test_least_recently_used_is_evicted() {
    let (pipeline, _) = pipeline_with_sink();
    let cache = MemoryForecastCache::new(&CacheConfig {
        max_entries: 2,
        ttl_secs: 0,
    });
    let input = sparse_input();
    let result = pipeline.generate_forecast(&input, 2).unwrap();
    let key = |h| ForecastKey::for_input(&input, h);

    cache.put(key(2), result.clone());
    thread::sleep(Duration::from_millis(5));
    cache.put(key(4), result.clone());
    thread::sleep(Duration::from_millis(5));
    // Touch the older entry so the newer one becomes the eviction candidate
    assert!(cache.get(&key(2)).is_some());
    thread::sleep(Duration::from_millis(5));
    cache.put(key(8), result);

    assert_eq!(cache.len(), 2);
    assert!(cache.get(&key(2)).is_some());
    assert!(cache.get(&key(4)).is_none());
    assert!(cache.get(&key(8)).is_some());
}

#[test]
fn test_concurrent_callers_agree() {
    let (pipeline, _) = pipeline_with_sink();
    let cache = MemoryForecastCache::default();
    let input = trending_input();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| pipeline.generate_cached(&cache, &input, 4).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.len(), 1);
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}
