//! Cache Metrics System
//!
//! Counters for the admission cache, reported through the [`CacheMetrics`]
//! trait as a `BTreeMap<String, f64>`, so reports list keys in a stable order.
//!
//! # Where Counters Live
//!
//! Each tier keeps its own counters next to its list, updated under the
//! tier's lock. [`CacheManager::lruk_metrics`](crate::CacheManager::lruk_metrics) locks both
//! tiers in the usual order and merges them into an [`LrukCacheMetrics`].

use std::collections::BTreeMap;
use std::string::{String, ToString};

pub mod admission;

pub use admission::{HistoryMetrics, LrukCacheMetrics, PromotedMetrics};

/// Request-level counters common to every cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoreCacheMetrics {
    /// Total number of `get` calls.
    pub requests: u64,

    /// Number of `get` calls that returned a value.
    pub cache_hits: u64,

    /// Number of entries removed because a tier was over capacity.
    pub evictions: u64,
}

impl CoreCacheMetrics {
    /// Creates zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a `get` that returned a value.
    pub fn record_hit(&mut self) {
        self.requests += 1;
        self.cache_hits += 1;
    }

    /// Records a `get` that returned nothing.
    ///
    /// Misses are not stored separately; they are `requests - cache_hits`.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Records a capacity eviction.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Number of `get` calls that returned nothing.
    pub fn cache_misses(&self) -> u64 {
        self.requests - self.cache_hits
    }

    /// Calculates the cache hit rate
    ///
    /// # Returns
    /// A value between 0.0 and 1.0, or 0.0 if no requests have been made
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Calculates the cache miss rate
    ///
    /// # Returns
    /// A value between 0.0 and 1.0, or 0.0 if no requests have been made
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_misses() as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Sums two sets of counters.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            requests: self.requests + other.requests,
            cache_hits: self.cache_hits + other.cache_hits,
            evictions: self.evictions + other.evictions,
        }
    }

    /// Convert core metrics to BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert("cache_misses".to_string(), self.cache_misses() as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("requests".to_string(), self.requests as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        if self.requests > 0 {
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions as f64 / self.requests as f64,
            );
        }

        metrics
    }
}

/// Trait for reporting metrics from a cache.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification
    fn algorithm_name(&self) -> &'static str;
}
