//! Two-Tier LRU-K Cache Manager
//!
//! Joins an [`AccessHistoryTracker`] and a [`PromotedCache`] behind a single
//! `get`/`put` surface. A key has to be seen `k + 1` times inside the history
//! window before a value for it is kept at all; after that, the entry lives
//! in the cache tier until it is evicted for capacity or goes unread for
//! longer than the cache window.
//!
//! # How It Works
//!
//! ```text
//! ┌───────────────────────────────── CacheManager ─────────────────────────────────┐
//! │                                                                                │
//! │   get(key)                                                                     │
//! │     │                                                                          │
//! │     ├─ in history index? ──▶ touch ──▶ count > k ? ──▶ promote ──▶ None        │
//! │     │                                      └── no ──────────────▶ None        │
//! │     │                                                                          │
//! │     ├─ in cache index?   ──▶ wait for payload (no locks held)                  │
//! │     │                        └──▶ touch ──▶ stale ? ──▶ drop ──────▶ None      │
//! │     │                                         └── no ───────────▶ payload     │
//! │     │                                                                          │
//! │     └─ unseen            ──▶ record first sight ────────────────▶ None        │
//! │                                                                                │
//! │   put(key, value) ──▶ in cache index? ──▶ fill payload, move to head           │
//! │                           └── no ──▶ dropped                                   │
//! └────────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `None` tells the caller to compute the value and `put` it. The four
//! reasons for a `None` (never seen, below threshold, pending, stale) are not
//! distinguished.
//!
//! # Locking
//!
//! Each tier sits behind its own `parking_lot::Mutex` together with its
//! key→handle side index. Promotion, the cache-index check in `get`, `clear`
//! and the metrics snapshot hold both, always taking the history lock first.
//! No path takes the cache lock and then the history lock.
//!
//! A reader that finds a pending entry clones the entry's
//! [`PayloadSlot`](crate::slot::PayloadSlot), releases both locks, and waits
//! on the slot. `put` fills the slot and wakes it; eviction closes the slot
//! and wakes it too.
//!
//! # Thread Safety
//!
//! `CacheManager` is `Send + Sync` when its keys, values, hasher and clock
//! are, and can be shared via `Arc`.

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheManagerConfig, ConfigError};
use crate::entry::Visit;
use crate::history::{AccessHistoryTracker, HistoryTouch};
use crate::list::Handle;
use crate::metrics::{CacheMetrics, HistoryMetrics, LrukCacheMetrics, PromotedMetrics};
use crate::promoted::{CacheTouch, PromotedCache};
use crate::slot::{PayloadSlot, WaitOutcome};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Hash builder used by the side indices unless another one is supplied.
#[cfg(feature = "hashbrown")]
pub use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

/// Hash builder used by the side indices unless another one is supplied.
#[cfg(not(feature = "hashbrown"))]
pub use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

struct HistoryTier<K, S, C> {
    tracker: AccessHistoryTracker<K, C>,
    index: HashMap<K, Handle, S>,
    metrics: HistoryMetrics,
}

struct CacheTier<K, V, S, C> {
    cache: PromotedCache<K, V, C>,
    index: HashMap<K, Handle, S>,
    metrics: PromotedMetrics,
}

/// A thread-safe LRU-K admission cache.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone`.
/// - `V`: Value type. Must implement `Clone`; `get` returns copies.
/// - `S`: Hash builder for the side indices. Defaults to `DefaultHashBuilder`.
/// - `C`: Time source. Defaults to [`SystemClock`].
///
/// # Examples
///
/// ```
/// use lruk_cache::CacheManager;
/// use std::time::Duration;
///
/// // Values are only kept for keys seen twice (k = 1) within 10 seconds.
/// let cache: CacheManager<String, u64> =
///     CacheManager::new(1024, 1, Duration::from_secs(10), 128, Duration::from_secs(60))
///         .unwrap();
///
/// assert_eq!(cache.get("answer"), None); // first sighting
/// assert_eq!(cache.get("answer"), None); // second sighting, promoted
/// cache.put("answer", 42);
/// assert_eq!(cache.get("answer"), Some(42));
/// ```
pub struct CacheManager<K, V, S = DefaultHashBuilder, C = SystemClock> {
    history: Mutex<HistoryTier<K, S, C>>,
    cache: Mutex<CacheTier<K, V, S, C>>,
    pending_timeout: Duration,
}

impl<K, V> CacheManager<K, V, DefaultHashBuilder, SystemClock>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a manager from plain parameters.
    ///
    /// The pending-read timeout is
    /// [`DEFAULT_PENDING_TIMEOUT`](crate::config::DEFAULT_PENDING_TIMEOUT).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a capacity or an expiry window is zero.
    pub fn new(
        history_capacity: usize,
        k: usize,
        history_expiry: Duration,
        cache_capacity: usize,
        cache_expiry: Duration,
    ) -> Result<Self, ConfigError> {
        let config = CacheManagerConfig::new(
            history_capacity,
            k,
            history_expiry,
            cache_capacity,
            cache_expiry,
        )?;
        Ok(Self::init(config, None))
    }

    /// Creates a manager from a configuration with an optional hasher.
    ///
    /// This is the recommended way to build a manager from a typed config.
    pub fn init(config: CacheManagerConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::with_hasher_and_clock(config, hasher.unwrap_or_default(), SystemClock)
    }
}

impl<K, V, C> CacheManager<K, V, DefaultHashBuilder, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    C: Clock + Clone,
{
    /// Creates a manager that reads time from `clock`.
    ///
    /// Both tiers share the clock.
    pub fn init_with_clock(config: CacheManagerConfig, clock: C) -> Self {
        Self::with_hasher_and_clock(config, DefaultHashBuilder::default(), clock)
    }
}

impl<K, V, S, C> CacheManager<K, V, S, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
    C: Clock + Clone,
{
    /// Creates a manager with a custom hash builder and time source.
    ///
    /// The hash builder is cloned for each side index.
    pub fn with_hasher_and_clock(config: CacheManagerConfig, hash_builder: S, clock: C) -> Self {
        let history = HistoryTier {
            tracker: AccessHistoryTracker::with_clock(config.history, clock.clone()),
            index: HashMap::with_capacity_and_hasher(
                config.history.capacity.get(),
                hash_builder.clone(),
            ),
            metrics: HistoryMetrics::default(),
        };
        let cache = CacheTier {
            cache: PromotedCache::with_clock(config.cache, clock),
            index: HashMap::with_capacity_and_hasher(config.cache.capacity.get(), hash_builder),
            metrics: PromotedMetrics::default(),
        };

        Self {
            history: Mutex::new(history),
            cache: Mutex::new(cache),
            pending_timeout: config.pending_timeout,
        }
    }

    /// How long `get` waits for the payload of a pending entry.
    #[inline]
    pub fn pending_timeout(&self) -> Duration {
        self.pending_timeout
    }

    /// Looks up `key`, recording the access.
    ///
    /// Returns the cached value only for promoted keys whose payload has been
    /// `put`. A promoted key without a payload waits up to
    /// [`pending_timeout`](Self::pending_timeout) for one. Every other case
    /// returns `None` and advances the key through the admission tiers.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = K>,
    {
        self.get_timeout(key, self.pending_timeout)
    }

    /// Like [`get`](Self::get), with a per-call bound on the pending wait.
    ///
    /// `Duration::ZERO` never blocks.
    pub fn get_timeout<Q>(&self, key: &Q, timeout: Duration) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = K>,
    {
        let mut history = self.history.lock();

        if let Some(&handle) = history.index.get(key) {
            self.observe_history(&mut history, key, handle);
            return None;
        }

        let cached = {
            let cache = self.cache.lock();
            let found = cache
                .index
                .get(key)
                .and_then(|&handle| cache.cache.pending_slot(handle).map(|slot| (handle, slot)));
            found
        };

        match cached {
            Some((handle, slot)) => {
                drop(history);
                self.read_cached(key, handle, slot, timeout)
            }
            None => {
                self.record_first_sight(&mut history, key);
                None
            }
        }
    }

    /// Stores the value for a promoted key.
    ///
    /// Keys that are still in history, or unseen, are ignored. Returns true
    /// if the payload was stored. Storing again overwrites the payload.
    pub fn put<Q>(&self, key: &Q, value: V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut cache = self.cache.lock();

        let handle = cache.index.get(key).copied();
        let Some(handle) = handle else {
            cache.metrics.dropped_puts += 1;
            trace!("put dropped for key outside the cache tier");
            return false;
        };

        if cache.cache.set_payload(handle, value) {
            cache.metrics.payload_writes += 1;
            true
        } else {
            false
        }
    }

    /// Returns true if `key` is waiting in the history tier.
    pub fn contains_history<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.history.lock().index.contains_key(key)
    }

    /// Returns true if `key` has been promoted to the cache tier.
    pub fn contains_cached<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.cache.lock().index.contains_key(key)
    }

    /// Visit count of a key, from whichever tier holds it.
    ///
    /// Does not count as an access.
    pub fn visit_count<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let history = self.history.lock();
        if let Some(&handle) = history.index.get(key) {
            return history.tracker.record(handle).map(|r| r.visit_count());
        }
        let cache = self.cache.lock();
        let handle = *cache.index.get(key)?;
        cache.cache.entry(handle).map(|e| e.record().visit_count())
    }

    /// Number of keys in the history tier.
    pub fn history_len(&self) -> usize {
        self.history.lock().tracker.len()
    }

    /// Number of entries in the cache tier, pending or filled.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().cache.len()
    }

    /// Drops both tiers.
    ///
    /// Readers waiting on a pending entry wake up and get `None`. Metrics are
    /// kept.
    pub fn clear(&self) {
        let mut history = self.history.lock();
        let mut cache = self.cache.lock();
        history.tracker.clear();
        history.index.clear();
        cache.cache.clear();
        cache.index.clear();
    }

    /// Snapshot of both tiers' counters.
    pub fn lruk_metrics(&self) -> LrukCacheMetrics {
        let history = self.history.lock();
        let cache = self.cache.lock();
        LrukCacheMetrics::new(history.metrics, cache.metrics)
    }

    fn observe_history<Q>(&self, history: &mut HistoryTier<K, S, C>, key: &Q, handle: Handle)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        history.metrics.core.record_miss();

        match history.tracker.touch(handle) {
            HistoryTouch::Promoted(record) => {
                let Some((owned, _)) = history.index.remove_entry(key) else {
                    return;
                };
                history.metrics.promotions += 1;
                let visits = record.visit_count();

                let mut cache = self.cache.lock();
                let (handle, evicted) = cache.cache.promote(record);
                cache.index.insert(owned, handle);
                if let Some(evicted) = evicted {
                    cache.index.remove(&evicted);
                    cache.metrics.core.record_eviction();
                    trace!(cache_len = cache.cache.len(), "evicted cache tail");
                }
                debug!(
                    visits,
                    cache_len = cache.cache.len(),
                    history_len = history.tracker.len(),
                    "promoted key to cache tier"
                );
            }
            HistoryTouch::Retained(Visit::Counted(count)) => {
                history.metrics.repeat_sightings += 1;
                trace!(count, "counted repeat sighting");
            }
            HistoryTouch::Retained(Visit::Restarted) => {
                history.metrics.restarts += 1;
                trace!("history window elapsed, count restarted");
            }
            HistoryTouch::Missing => {
                history.index.remove(key);
            }
        }
    }

    fn read_cached<Q>(
        &self,
        key: &Q,
        handle: Handle,
        slot: Arc<PayloadSlot<V>>,
        timeout: Duration,
    ) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let outcome = slot.wait(timeout);

        let mut cache = self.cache.lock();
        if matches!(outcome, WaitOutcome::TimedOut) {
            cache.metrics.pending_timeouts += 1;
            trace!(?timeout, "gave up waiting for pending payload");
        }

        let value = match cache.cache.touch(handle) {
            CacheTouch::Fresh(current) => current.or_else(|| outcome.into_value()),
            CacheTouch::Expired => {
                if cache.index.get(key) == Some(&handle) {
                    cache.index.remove(key);
                }
                cache.metrics.expirations += 1;
                debug!(cache_len = cache.cache.len(), "dropped stale cache entry");
                None
            }
            CacheTouch::Missing => None,
        };

        if value.is_some() {
            cache.metrics.core.record_hit();
        } else {
            cache.metrics.core.record_miss();
        }
        value
    }

    fn record_first_sight<Q>(&self, history: &mut HistoryTier<K, S, C>, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + ToOwned<Owned = K>,
    {
        let owned = key.to_owned();
        let (handle, evicted) = history.tracker.record_first_sight(owned.clone());
        history.index.insert(owned, handle);
        history.metrics.core.record_miss();
        history.metrics.first_sightings += 1;

        if let Some(evicted) = evicted {
            history.index.remove(&evicted);
            history.metrics.core.record_eviction();
            trace!(history_len = history.tracker.len(), "evicted history tail");
        }
    }
}

impl<K, V, S, C> CacheMetrics for CacheManager<K, V, S, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
    C: Clock + Clone,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.lruk_metrics().to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU-K"
    }
}

impl<K, V, S, C> fmt::Debug for CacheManager<K, V, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("history", &self.history.lock().tracker)
            .field("cache", &self.cache.lock().cache)
            .field("pending_timeout", &self.pending_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::thread;

    type Manager = CacheManager<String, i32, DefaultHashBuilder, ManualClock>;

    fn manager(
        history_capacity: usize,
        k: usize,
        cache_capacity: usize,
        pending_ms: u64,
    ) -> (Manager, ManualClock) {
        let clock = ManualClock::new();
        let config = CacheManagerConfig::new(
            history_capacity,
            k,
            Duration::from_secs(1),
            cache_capacity,
            Duration::from_secs(1),
        )
        .unwrap()
        .with_pending_timeout(Duration::from_millis(pending_ms));
        (CacheManager::init_with_clock(config, clock.clone()), clock)
    }

    fn promote(cache: &Manager, key: &str, k: usize) {
        for _ in 0..=k {
            assert_eq!(cache.get(key), None);
        }
        assert!(cache.contains_cached(key));
    }

    #[test]
    fn test_first_sight_goes_to_history() {
        let (cache, _clock) = manager(4, 1, 4, 0);
        assert_eq!(cache.get("a"), None);
        assert!(cache.contains_history("a"));
        assert!(!cache.contains_cached("a"));
        assert_eq!(cache.visit_count("a"), Some(1));
    }

    #[test]
    fn test_promotion_moves_key_between_indices() {
        let (cache, _clock) = manager(4, 2, 4, 0);
        cache.get("a");
        cache.get("a");
        assert_eq!(cache.visit_count("a"), Some(2));
        assert!(cache.contains_history("a"));

        assert_eq!(cache.get("a"), None);
        assert!(!cache.contains_history("a"));
        assert!(cache.contains_cached("a"));
        assert_eq!(cache.visit_count("a"), Some(1));
        assert_eq!(cache.history_len(), 0);
        assert_eq!(cache.cache_len(), 1);
    }

    #[test]
    fn test_put_then_get() {
        let (cache, _clock) = manager(4, 1, 4, 0);
        promote(&cache, "a", 1);
        assert!(cache.put("a", 42));
        assert_eq!(cache.get("a"), Some(42));
        assert_eq!(cache.get("a"), Some(42));
    }

    #[test]
    fn test_put_for_unpromoted_key_is_dropped() {
        let (cache, _clock) = manager(4, 1, 4, 0);
        assert!(!cache.put("never-seen", 1));
        cache.get("a");
        assert!(!cache.put("a", 1));
        assert!(!cache.contains_cached("a"));
        assert_eq!(cache.lruk_metrics().promoted.dropped_puts, 2);
    }

    #[test]
    fn test_put_overwrites_payload() {
        let (cache, _clock) = manager(4, 1, 4, 0);
        promote(&cache, "a", 1);
        cache.put("a", 1);
        cache.put("a", 2);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_stale_entry_restarts_in_history() {
        let (cache, clock) = manager(4, 1, 4, 0);
        promote(&cache, "a", 1);
        cache.put("a", 7);

        clock.advance(Duration::from_millis(1500));
        assert_eq!(cache.get("a"), None);
        assert!(!cache.contains_cached("a"));
        assert!(!cache.contains_history("a"));

        assert_eq!(cache.get("a"), None);
        assert!(cache.contains_history("a"));
        assert_eq!(cache.visit_count("a"), Some(1));
    }

    #[test]
    fn test_cache_eviction_drops_index_entry() {
        let (cache, _clock) = manager(8, 1, 2, 0);
        promote(&cache, "a", 1);
        promote(&cache, "b", 1);
        promote(&cache, "c", 1);

        assert!(!cache.contains_cached("a"));
        assert!(cache.contains_cached("b"));
        assert!(cache.contains_cached("c"));
        assert_eq!(cache.cache_len(), 2);
        assert!(!cache.put("a", 1));
    }

    #[test]
    fn test_pending_get_times_out_and_keeps_entry() {
        let (cache, _clock) = manager(4, 1, 4, 10);
        promote(&cache, "a", 1);

        assert_eq!(cache.get("a"), None);
        assert!(cache.contains_cached("a"));
        assert_eq!(cache.lruk_metrics().promoted.pending_timeouts, 1);
        // The timed-out read still counts as an access.
        assert_eq!(cache.visit_count("a"), Some(2));

        assert!(cache.put("a", 5));
        assert_eq!(cache.get("a"), Some(5));
    }

    #[test]
    fn test_waiting_reader_gets_value_from_put() {
        let (cache, _clock) = manager(4, 1, 4, 5_000);
        let cache = Arc::new(cache);
        promote(&cache, "a", 1);

        let reader = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get("a"))
        };
        thread::sleep(Duration::from_millis(20));
        cache.put("a", 99);

        assert_eq!(reader.join().unwrap(), Some(99));
    }

    #[test]
    fn test_clear_empties_both_tiers() {
        let (cache, _clock) = manager(4, 1, 4, 0);
        cache.get("h");
        promote(&cache, "c", 1);

        cache.clear();
        assert_eq!(cache.history_len(), 0);
        assert_eq!(cache.cache_len(), 0);
        assert!(!cache.contains_history("h"));
        assert!(!cache.contains_cached("c"));
    }

    #[test]
    fn test_metrics_report() {
        let (cache, _clock) = manager(4, 1, 4, 0);
        promote(&cache, "a", 1);
        cache.put("a", 1);
        cache.get("a");

        let metrics = cache.lruk_metrics();
        assert_eq!(metrics.history.first_sightings, 1);
        assert_eq!(metrics.history.promotions, 1);
        assert_eq!(metrics.promoted.payload_writes, 1);
        assert_eq!(metrics.core().requests, 3);
        assert_eq!(metrics.core().cache_hits, 1);

        let map = cache.metrics();
        assert_eq!(map.get("promotions"), Some(&1.0));
        assert_eq!(cache.algorithm_name(), "LRU-K");
    }

    #[test]
    fn test_new_validates_parameters() {
        let err = CacheManager::<String, i32>::new(
            1,
            1,
            Duration::from_secs(1),
            0,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::ZeroCacheCapacity);
    }

    #[test]
    fn test_init_with_supplied_hasher() {
        let config = CacheManagerConfig::new(
            4,
            1,
            Duration::from_secs(1),
            4,
            Duration::from_secs(1),
        )
        .unwrap();
        let cache: CacheManager<String, i32> =
            CacheManager::init(config, Some(DefaultHashBuilder::default()));
        let clock = ManualClock::new();
        let other: Manager =
            CacheManager::with_hasher_and_clock(config, DefaultHashBuilder::default(), clock);

        assert_eq!(cache.get("a"), None);
        assert_eq!(other.get("a"), None);
        assert!(other.contains_history("a"));
        assert_eq!(cache.visit_count("a"), Some(1));
    }
}
