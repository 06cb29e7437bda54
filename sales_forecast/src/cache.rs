//! Forecast memoisation
//!
//! Results are keyed by the identity of the input (dataset, row count and
//! date range) plus the horizon. Stored results are immutable: a second
//! `put` for a live key keeps the first value, so concurrent requests that
//! both missed still agree on one answer.

use crate::config::CacheConfig;
use crate::data::FilteredTransactions;
use crate::pipeline::ForecastResult;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identity of a forecast request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastKey {
    pub dataset_id: String,
    pub row_count: usize,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub horizon: usize,
}

impl ForecastKey {
    pub fn for_input(input: &FilteredTransactions, horizon: usize) -> Self {
        Self {
            dataset_id: input.dataset_id().to_string(),
            row_count: input.len(),
            min_date: input.min_date(),
            max_date: input.max_date(),
            horizon,
        }
    }
}

impl fmt::Display for ForecastKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
        write!(
            f,
            "{}:{}:{}..{}:h{}",
            self.dataset_id,
            self.row_count,
            date(self.min_date),
            date(self.max_date),
            self.horizon
        )
    }
}

/// Storage for computed forecasts
pub trait ForecastCache: Send + Sync {
    fn get(&self, key: &ForecastKey) -> Option<ForecastResult>;

    /// Store `result` unless a live value exists; returns the stored value
    fn put(&self, key: ForecastKey, result: ForecastResult) -> ForecastResult;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct CacheEntry {
    result: Arc<ForecastResult>,
    expires_at: Option<Instant>,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(result: ForecastResult, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            result: Arc::new(result),
            expires_at: ttl.map(|ttl| now + ttl),
            last_accessed: now,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// In-process cache backed by a concurrent map.
///
/// Entries expire after the configured TTL; when full, expired entries go
/// first and then the least recently used ones.
pub struct MemoryForecastCache {
    data: DashMap<ForecastKey, CacheEntry>,
    max_entries: usize,
    ttl: Option<Duration>,
}

impl MemoryForecastCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            data: DashMap::new(),
            max_entries: config.max_entries.max(1),
            ttl: config.ttl(),
        }
    }

    fn evict_if_needed(&self) {
        if self.data.len() < self.max_entries {
            return;
        }

        self.data.retain(|_, entry| !entry.is_expired());

        let current_len = self.data.len();
        if current_len < self.max_entries {
            return;
        }

        let to_evict = current_len + 1 - self.max_entries;
        let mut entries: Vec<_> = self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.last_accessed))
            .collect();
        entries.sort_by_key(|(_, last_accessed)| *last_accessed);

        for (key, _) in entries.into_iter().take(to_evict) {
            self.data.remove(&key);
        }
    }
}

impl Default for MemoryForecastCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl ForecastCache for MemoryForecastCache {
    fn get(&self, key: &ForecastKey) -> Option<ForecastResult> {
        let mut entry = self.data.get_mut(key)?;
        if entry.is_expired() {
            drop(entry);
            self.data.remove(key);
            return None;
        }
        entry.touch();
        Some(entry.result.as_ref().clone())
    }

    fn put(&self, key: ForecastKey, result: ForecastResult) -> ForecastResult {
        if !self.data.contains_key(&key) {
            self.evict_if_needed();
        }

        let stored = match self.data.entry(key) {
            Entry::Occupied(mut e) => {
                if e.get().is_expired() {
                    e.insert(CacheEntry::new(result, self.ttl));
                } else {
                    e.get_mut().touch();
                }
                Arc::clone(&e.get().result)
            }
            Entry::Vacant(e) => {
                let entry = e.insert(CacheEntry::new(result, self.ttl));
                Arc::clone(&entry.result)
            }
        };

        stored.as_ref().clone()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
