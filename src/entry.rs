//! Access Records and Cache Entries
//!
//! Both tiers track the same per-key bookkeeping, an [`AccessRecord`]. The
//! history tier stores records directly; the promoted tier wraps the same
//! record in a [`CacheEntry`] together with the payload slot. Promotion moves
//! the record value from one tier to the other instead of building a new one.
//!
//! # Visit Counting
//!
//! Every observation first checks the gap since the last access against the
//! tier's expiry window:
//!
//! ```text
//!   gap > expiry   ──▶  visit_count = 1            (Visit::Restarted)
//!   gap <= expiry  ──▶  visit_count += 1           (Visit::Counted(n))
//!   either way     ──▶  last_access = now
//! ```
//!
//! The counter is never incremented across an expired gap.
//!
//! # Examples
//!
//! ```
//! use lruk_cache::entry::{AccessRecord, Visit};
//! use std::time::{Duration, Instant};
//!
//! let window = Duration::from_millis(1000);
//! let t0 = Instant::now();
//! let mut record = AccessRecord::new("page", t0);
//!
//! assert_eq!(record.observe(t0 + Duration::from_millis(100), window), Visit::Counted(2));
//! assert_eq!(record.observe(t0 + Duration::from_millis(5000), window), Visit::Restarted);
//! assert_eq!(record.visit_count(), 1);
//! ```

use crate::list::EntryPolicy;
use crate::slot::PayloadSlot;
use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of applying one observation to an [`AccessRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// The gap was within the window; carries the new visit count.
    Counted(usize),
    /// The gap exceeded the window; the count restarted at 1.
    Restarted,
}

/// Per-key visit bookkeeping shared by both tiers.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessRecord<K> {
    key: K,
    visit_count: usize,
    last_access: Instant,
}

impl<K> AccessRecord<K> {
    /// Creates the record for a first sighting at `now`.
    #[inline]
    pub fn new(key: K, now: Instant) -> Self {
        Self {
            key,
            visit_count: 1,
            last_access: now,
        }
    }

    /// The tracked key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Observations counted in the current window, always at least 1.
    #[inline]
    pub fn visit_count(&self) -> usize {
        self.visit_count
    }

    /// Time of the last counted observation.
    #[inline]
    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    /// Returns true if more than `expiry` has passed since the last access.
    #[inline]
    pub fn is_expired(&self, now: Instant, expiry: Duration) -> bool {
        now.saturating_duration_since(self.last_access) > expiry
    }

    /// Applies one observation at `now` under the window `expiry`.
    pub fn observe(&mut self, now: Instant, expiry: Duration) -> Visit {
        let visit = if self.is_expired(now, expiry) {
            self.visit_count = 1;
            Visit::Restarted
        } else {
            self.visit_count = self.visit_count.saturating_add(1);
            Visit::Counted(self.visit_count)
        };
        self.last_access = now;
        visit
    }

    /// Restarts observation at `now` with a count of 1.
    #[inline]
    pub fn reset(&mut self, now: Instant) {
        self.visit_count = 1;
        self.last_access = now;
    }
}

impl<K: fmt::Debug> fmt::Debug for AccessRecord<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessRecord")
            .field("key", &self.key)
            .field("visit_count", &self.visit_count)
            .field("last_access", &self.last_access)
            .finish()
    }
}

/// A promoted entry: the record that earned admission plus its payload.
///
/// The payload lives in a shared [`PayloadSlot`] so readers can wait for it
/// without holding the tier lock.
pub struct CacheEntry<K, V> {
    record: AccessRecord<K>,
    payload: Arc<PayloadSlot<V>>,
}

impl<K, V> CacheEntry<K, V> {
    /// Wraps `record` with an empty payload.
    pub fn pending(record: AccessRecord<K>) -> Self {
        Self {
            record,
            payload: Arc::new(PayloadSlot::pending()),
        }
    }

    /// The record that tracks this entry.
    #[inline]
    pub fn record(&self) -> &AccessRecord<K> {
        &self.record
    }

    /// The record, mutably.
    #[inline]
    pub fn record_mut(&mut self) -> &mut AccessRecord<K> {
        &mut self.record
    }

    /// The tracked key.
    #[inline]
    pub fn key(&self) -> &K {
        self.record.key()
    }

    /// The payload slot shared with waiting readers.
    #[inline]
    pub fn slot(&self) -> &Arc<PayloadSlot<V>> {
        &self.payload
    }

    /// Returns true while no payload has been stored.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.payload.is_pending()
    }
}

impl<K, V: Clone> CacheEntry<K, V> {
    /// Copy of the current payload, if any.
    #[inline]
    pub fn payload(&self) -> Option<V> {
        self.payload.peek()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("record", &self.record)
            .field("payload", &self.payload)
            .finish()
    }
}

/// List policy for history records: same key means same entry.
pub struct RecordPolicy<K>(PhantomData<fn(K)>);

impl<K> Default for RecordPolicy<K> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<K> fmt::Debug for RecordPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecordPolicy")
    }
}

impl<K: Eq> EntryPolicy<AccessRecord<K>> for RecordPolicy<K> {
    #[inline]
    fn same(&self, a: &AccessRecord<K>, b: &AccessRecord<K>) -> bool {
        a.key == b.key
    }
}

/// List policy for promoted entries.
///
/// Entries compare by key. Teardown closes the payload slot so any reader
/// still waiting on an evicted entry wakes up with nothing.
pub struct EntryTeardownPolicy<K, V>(PhantomData<fn(K, V)>);

impl<K, V> Default for EntryTeardownPolicy<K, V> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<K, V> fmt::Debug for EntryTeardownPolicy<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EntryTeardownPolicy")
    }
}

impl<K: Eq, V> EntryPolicy<CacheEntry<K, V>> for EntryTeardownPolicy<K, V> {
    #[inline]
    fn same(&self, a: &CacheEntry<K, V>, b: &CacheEntry<K, V>) -> bool {
        a.key() == b.key()
    }

    fn teardown(&self, entry: CacheEntry<K, V>) {
        entry.payload.close();
    }
}
