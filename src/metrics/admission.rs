//! LRU-K Admission Metrics
//!
//! Per-tier counters for the two-tier admission cache, plus the merged
//! report.

use super::{CacheMetrics, CoreCacheMetrics};
use std::collections::BTreeMap;
use std::string::{String, ToString};

/// Counters kept by the history tier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HistoryMetrics {
    /// Requests answered from the history path (always misses).
    pub core: CoreCacheMetrics,
    /// Keys recorded for the first time.
    pub first_sightings: u64,
    /// Sightings that were counted without reaching the threshold.
    pub repeat_sightings: u64,
    /// Sightings whose gap exceeded the window and restarted the count.
    pub restarts: u64,
    /// Keys handed over to the cache tier.
    pub promotions: u64,
}

/// Counters kept by the promoted tier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PromotedMetrics {
    /// Requests answered from the cache path.
    pub core: CoreCacheMetrics,
    /// Entries dropped on read because they went stale.
    pub expirations: u64,
    /// Reads that gave up waiting for a pending payload.
    pub pending_timeouts: u64,
    /// Payloads stored by `put`.
    pub payload_writes: u64,
    /// `put` calls for keys that were not in the cache tier.
    pub dropped_puts: u64,
}

/// Merged metrics for a [`CacheManager`](crate::CacheManager).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LrukCacheMetrics {
    /// History tier counters.
    pub history: HistoryMetrics,
    /// Cache tier counters.
    pub promoted: PromotedMetrics,
}

impl LrukCacheMetrics {
    /// Combines the counters of both tiers.
    pub fn new(history: HistoryMetrics, promoted: PromotedMetrics) -> Self {
        Self { history, promoted }
    }

    /// Request-level totals across both tiers.
    pub fn core(&self) -> CoreCacheMetrics {
        self.history.core.merged(&self.promoted.core)
    }

    /// Fraction of promotions whose entry was eventually written by `put`.
    ///
    /// A low value means callers are not feeding values back after a miss.
    pub fn fill_ratio(&self) -> f64 {
        if self.history.promotions > 0 {
            (self.promoted.payload_writes as f64 / self.history.promotions as f64).min(1.0)
        } else {
            0.0
        }
    }

    /// Converts the metrics to a BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core().to_btreemap();

        metrics.insert(
            "history_evictions".to_string(),
            self.history.core.evictions as f64,
        );
        metrics.insert(
            "first_sightings".to_string(),
            self.history.first_sightings as f64,
        );
        metrics.insert(
            "repeat_sightings".to_string(),
            self.history.repeat_sightings as f64,
        );
        metrics.insert("history_restarts".to_string(), self.history.restarts as f64);
        metrics.insert("promotions".to_string(), self.history.promotions as f64);

        metrics.insert(
            "cache_evictions".to_string(),
            self.promoted.core.evictions as f64,
        );
        metrics.insert(
            "expirations".to_string(),
            self.promoted.expirations as f64,
        );
        metrics.insert(
            "pending_timeouts".to_string(),
            self.promoted.pending_timeouts as f64,
        );
        metrics.insert(
            "payload_writes".to_string(),
            self.promoted.payload_writes as f64,
        );
        metrics.insert(
            "dropped_puts".to_string(),
            self.promoted.dropped_puts as f64,
        );
        metrics.insert("fill_ratio".to_string(), self.fill_ratio());

        metrics
    }
}

impl CacheMetrics for LrukCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU-K"
    }
}
