//! Promoted Cache Tier
//!
//! Holds the entries that earned admission in the history tier. Each entry
//! reuses the [`AccessRecord`] it was promoted with and adds a payload slot
//! that starts empty and is filled by the caller's `put`.
//!
//! # Staleness
//!
//! Reads apply the same counter rule as the history tier, under this tier's
//! own window. An entry whose last read is older than the window is dropped
//! on the read that notices it; the key then has to start over in history.
//! Writes do not count as reads.
//!
//! ```text
//!   promote ──▶ [pending] ──set_payload──▶ [filled] ──touch (gap ≤ expiry)──▶ [filled, head]
//!                   │                          │
//!                   └────── touch (gap > expiry) ──────▶ Expired (removed)
//! ```
//!
//! Capacity eviction removes the tail, pending or not. Removal closes the
//! entry's payload slot, waking anyone still waiting on it.

use crate::clock::{Clock, SystemClock};
use crate::config::PromotedCacheConfig;
use crate::entry::{AccessRecord, CacheEntry, EntryTeardownPolicy, Visit};
use crate::list::{Handle, List};
use crate::slot::PayloadSlot;
use core::fmt;
use core::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// Result of [`PromotedCache::touch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheTouch<V> {
    /// The entry is still fresh and moved to the head. Carries the payload,
    /// which is `None` while no `put` has arrived.
    Fresh(Option<V>),
    /// The read gap exceeded the window; the entry was removed.
    Expired,
    /// The handle did not refer to a cached entry.
    Missing,
}

/// Bounded queue of promoted entries.
///
/// # Examples
///
/// ```
/// use lruk_cache::config::PromotedCacheConfig;
/// use lruk_cache::entry::AccessRecord;
/// use lruk_cache::promoted::{CacheTouch, PromotedCache};
/// use core::num::NonZeroUsize;
/// use std::time::{Duration, Instant};
///
/// let mut cache: PromotedCache<&str, u32> = PromotedCache::init(PromotedCacheConfig {
///     capacity: NonZeroUsize::new(2).unwrap(),
///     expiry: Duration::from_secs(60),
/// });
///
/// let (handle, _) = cache.promote(AccessRecord::new("page", Instant::now()));
/// assert_eq!(cache.touch(handle), CacheTouch::Fresh(None));
///
/// cache.set_payload(handle, 7);
/// assert_eq!(cache.touch(handle), CacheTouch::Fresh(Some(7)));
/// ```
pub struct PromotedCache<K, V, C = SystemClock> {
    config: PromotedCacheConfig,
    list: List<CacheEntry<K, V>, EntryTeardownPolicy<K, V>>,
    clock: C,
}

impl<K, V, C: Clock + Default> PromotedCache<K, V, C> {
    /// Creates an empty tier with the default clock.
    pub fn init(config: PromotedCacheConfig) -> Self {
        Self::with_clock(config, C::default())
    }
}

impl<K, V, C: Clock> PromotedCache<K, V, C> {
    /// Creates an empty tier reading time from `clock`.
    pub fn with_clock(config: PromotedCacheConfig, clock: C) -> Self {
        Self {
            config,
            list: List::new(),
            clock,
        }
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> NonZeroUsize {
        self.config.capacity
    }

    /// Staleness window.
    #[inline]
    pub fn expiry(&self) -> Duration {
        self.config.expiry
    }

    /// Number of entries, pending or filled.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if the tier holds no entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The entry behind `handle`, if it is still cached.
    #[inline]
    pub fn entry(&self, handle: Handle) -> Option<&CacheEntry<K, V>> {
        self.list.get(handle)
    }

    /// Entries from most to least recently active.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry<K, V>> + '_ {
        self.list.iter()
    }

    /// The payload slot of an entry, for waiting outside the tier lock.
    pub fn pending_slot(&self, handle: Handle) -> Option<Arc<PayloadSlot<V>>> {
        self.list.get(handle).map(|entry| Arc::clone(entry.slot()))
    }
}

impl<K: Eq, V, C: Clock> PromotedCache<K, V, C> {
    /// Stores the payload for an entry and moves it to the head.
    ///
    /// The visit counter is left alone. Waiting readers are woken. Returns
    /// false if the handle is stale.
    pub fn set_payload(&mut self, handle: Handle, value: V) -> bool {
        match self.list.get(handle) {
            Some(entry) if entry.slot().fill(value) => self.list.move_to_front(handle),
            _ => false,
        }
    }

    /// Linear scan for the entry of `key`.
    pub fn find(&self, key: K) -> Option<Handle> {
        let probe = CacheEntry::pending(AccessRecord::new(key, self.clock.now()));
        self.list.find(&probe)
    }

    /// Drops every entry, closing all payload slots.
    pub fn clear(&mut self) {
        self.list.clear();
    }
}

impl<K: Eq + Clone, V, C: Clock> PromotedCache<K, V, C> {
    /// Admits a record handed over by the history tier.
    ///
    /// The record restarts at a count of 1 under this tier's window and gets
    /// an empty payload. If the tier is now over capacity the tail entry is
    /// removed and its key returned.
    pub fn promote(&mut self, mut record: AccessRecord<K>) -> (Handle, Option<K>) {
        record.reset(self.clock.now());
        let handle = self.list.insert(None, CacheEntry::pending(record));

        let evicted = if self.list.len() > self.config.capacity.get() {
            self.list.remove_last_with(|entry| entry.key().clone())
        } else {
            None
        };

        (handle, evicted)
    }
}

impl<K: Eq, V: Clone, C: Clock> PromotedCache<K, V, C> {
    /// Registers a read of an entry.
    ///
    /// Applies the counter rule from [`AccessRecord::observe`]. A gap longer
    /// than the window removes the entry and reports
    /// [`CacheTouch::Expired`]; otherwise the same node moves to the head.
    pub fn touch(&mut self, handle: Handle) -> CacheTouch<V> {
        if !self.list.detach(handle) {
            return CacheTouch::Missing;
        }

        let now = self.clock.now();
        let expiry = self.config.expiry;
        let visit = match self.list.get_mut(handle) {
            Some(entry) => entry.record_mut().observe(now, expiry),
            None => return CacheTouch::Missing,
        };

        if visit == Visit::Restarted {
            self.list.remove(handle);
            return CacheTouch::Expired;
        }

        self.list.attach(None, handle);
        CacheTouch::Fresh(self.list.get(handle).and_then(CacheEntry::payload))
    }
}

impl<K, V, C> fmt::Debug for PromotedCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromotedCache")
            .field("config", &self.config)
            .field("len", &self.list.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::slot::WaitOutcome;

    type Cache = PromotedCache<&'static str, i32, ManualClock>;

    fn cache(capacity: usize, expiry_ms: u64) -> (Cache, ManualClock) {
        let clock = ManualClock::new();
        let config = PromotedCacheConfig {
            capacity: NonZeroUsize::new(capacity).unwrap(),
            expiry: Duration::from_millis(expiry_ms),
        };
        (PromotedCache::with_clock(config, clock.clone()), clock)
    }

    fn record(key: &'static str, clock: &ManualClock) -> AccessRecord<&'static str> {
        AccessRecord::new(key, clock.now())
    }

    fn keys(cache: &Cache) -> Vec<&'static str> {
        cache.iter().map(|e| *e.key()).collect()
    }

    #[test]
    fn test_promote_resets_record_and_starts_pending() {
        let (mut cache, clock) = cache(2, 1000);
        let mut rec = record("a", &clock);
        rec.observe(clock.now(), Duration::from_secs(1));
        rec.observe(clock.now(), Duration::from_secs(1));
        assert_eq!(rec.visit_count(), 3);

        clock.advance(Duration::from_millis(50));
        let (handle, evicted) = cache.promote(rec);
        assert!(evicted.is_none());

        let entry = cache.entry(handle).unwrap();
        assert_eq!(entry.record().visit_count(), 1);
        assert_eq!(entry.record().last_access(), clock.now());
        assert!(entry.is_pending());
    }

    #[test]
    fn test_promote_evicts_tail_when_full() {
        let (mut cache, clock) = cache(2, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        cache.promote(record("b", &clock));
        let (_, evicted) = cache.promote(record("c", &clock));

        assert_eq!(evicted, Some("a"));
        assert_eq!(cache.len(), 2);
        assert!(cache.entry(a).is_none());
        assert_eq!(keys(&cache), vec!["c", "b"]);
    }

    #[test]
    fn test_eviction_closes_pending_slot() {
        let (mut cache, clock) = cache(1, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        let slot = cache.pending_slot(a).unwrap();

        cache.promote(record("b", &clock));
        assert_eq!(slot.wait(Duration::from_secs(1)), WaitOutcome::Closed);
    }

    #[test]
    fn test_set_payload_moves_to_front_without_counting() {
        let (mut cache, clock) = cache(3, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        cache.promote(record("b", &clock));
        assert_eq!(keys(&cache), vec!["b", "a"]);

        assert!(cache.set_payload(a, 10));
        assert_eq!(keys(&cache), vec!["a", "b"]);
        assert_eq!(cache.entry(a).unwrap().record().visit_count(), 1);
        assert_eq!(cache.entry(a).unwrap().payload(), Some(10));
    }

    #[test]
    fn test_set_payload_wakes_waiter_slot() {
        let (mut cache, clock) = cache(1, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        let slot = cache.pending_slot(a).unwrap();
        cache.set_payload(a, 99);
        assert_eq!(slot.wait(Duration::ZERO), WaitOutcome::Ready(99));
    }

    #[test]
    fn test_set_payload_on_stale_handle() {
        let (mut cache, clock) = cache(1, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        cache.promote(record("b", &clock));
        assert!(!cache.set_payload(a, 1));
    }

    #[test]
    fn test_touch_fresh_returns_payload() {
        let (mut cache, clock) = cache(2, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        let (b, _) = cache.promote(record("b", &clock));
        cache.set_payload(b, 2);
        cache.set_payload(a, 1);

        clock.advance(Duration::from_millis(500));
        assert_eq!(cache.touch(b), CacheTouch::Fresh(Some(2)));
        assert_eq!(keys(&cache), vec!["b", "a"]);
        assert_eq!(cache.entry(b).unwrap().record().visit_count(), 2);
    }

    #[test]
    fn test_touch_after_window_expires_entry() {
        let (mut cache, clock) = cache(2, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        cache.set_payload(a, 42);

        clock.advance(Duration::from_millis(1001));
        assert_eq!(cache.touch(a), CacheTouch::Expired);
        assert!(cache.is_empty());
        assert_eq!(cache.touch(a), CacheTouch::Missing);
    }

    #[test]
    fn test_writes_do_not_refresh_staleness() {
        let (mut cache, clock) = cache(2, 1000);
        let (a, _) = cache.promote(record("a", &clock));

        clock.advance(Duration::from_millis(900));
        cache.set_payload(a, 1);
        clock.advance(Duration::from_millis(200));

        assert_eq!(cache.touch(a), CacheTouch::Expired);
    }

    #[test]
    fn test_find_and_clear() {
        let (mut cache, clock) = cache(2, 1000);
        let (a, _) = cache.promote(record("a", &clock));
        let slot = cache.pending_slot(a).unwrap();
        assert_eq!(cache.find("a"), Some(a));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.find("a"), None);
        assert!(!slot.is_pending());
    }
}
