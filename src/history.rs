//! Access History Tier
//!
//! Tracks keys that have been seen but not yet promoted. Each key has one
//! [`AccessRecord`] in an ordered [`List`]; the head is the most recently
//! seen key and the tail is the first to be forgotten when the tier is full.
//!
//! # Promotion
//!
//! ```text
//!   first sight ──▶ count=1 ──touch──▶ count=2 ──touch──▶ ... count > k ──▶ Promoted
//!                      ▲                                        │
//!                      └──── gap > expiry restarts at 1 ◀───────┘
//! ```
//!
//! A promoted record is taken out of the list and handed back to the caller,
//! who moves it into the [`PromotedCache`](crate::promoted::PromotedCache).
//!
//! # Thread Safety
//!
//! Not thread-safe on its own; the [`CacheManager`](crate::CacheManager)
//! keeps it behind the history lock.

use crate::clock::{Clock, SystemClock};
use crate::config::HistoryConfig;
use crate::entry::{AccessRecord, RecordPolicy, Visit};
use crate::list::{Handle, List};
use core::fmt;
use core::num::NonZeroUsize;
use std::time::Duration;

/// Result of [`AccessHistoryTracker::touch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryTouch<K> {
    /// The visit count passed `k`; the record left the tier.
    Promoted(AccessRecord<K>),
    /// The record stays in the tier, moved to the head.
    Retained(Visit),
    /// The handle did not refer to a tracked record.
    Missing,
}

/// Bounded queue of seen-but-not-promoted keys.
///
/// # Examples
///
/// ```
/// use lruk_cache::config::HistoryConfig;
/// use lruk_cache::history::{AccessHistoryTracker, HistoryTouch};
/// use core::num::NonZeroUsize;
/// use std::time::Duration;
///
/// let mut history: AccessHistoryTracker<&str> = AccessHistoryTracker::init(HistoryConfig {
///     capacity: NonZeroUsize::new(8).unwrap(),
///     k: 1,
///     expiry: Duration::from_secs(60),
/// });
///
/// let (handle, evicted) = history.record_first_sight("page");
/// assert!(evicted.is_none());
///
/// match history.touch(handle) {
///     HistoryTouch::Promoted(record) => assert_eq!(record.key(), &"page"),
///     other => panic!("expected promotion, got {:?}", other),
/// }
/// assert!(history.is_empty());
/// ```
pub struct AccessHistoryTracker<K, C = SystemClock> {
    config: HistoryConfig,
    list: List<AccessRecord<K>, RecordPolicy<K>>,
    clock: C,
}

impl<K, C: Clock + Default> AccessHistoryTracker<K, C> {
    /// Creates an empty tracker with the default clock.
    pub fn init(config: HistoryConfig) -> Self {
        Self::with_clock(config, C::default())
    }
}

impl<K, C: Clock> AccessHistoryTracker<K, C> {
    /// Creates an empty tracker reading time from `clock`.
    pub fn with_clock(config: HistoryConfig, clock: C) -> Self {
        Self {
            config,
            list: List::new(),
            clock,
        }
    }

    /// Maximum number of tracked keys.
    #[inline]
    pub fn capacity(&self) -> NonZeroUsize {
        self.config.capacity
    }

    /// Promotion threshold.
    #[inline]
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Observation window.
    #[inline]
    pub fn expiry(&self) -> Duration {
        self.config.expiry
    }

    /// Number of tracked keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if no key is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The record behind `handle`, if it is still tracked.
    #[inline]
    pub fn record(&self, handle: Handle) -> Option<&AccessRecord<K>> {
        self.list.get(handle)
    }

    /// Records from most to least recently seen.
    pub fn iter(&self) -> impl Iterator<Item = &AccessRecord<K>> + '_ {
        self.list.iter()
    }

    /// Registers one more sighting of a tracked key.
    ///
    /// The counter rule from [`AccessRecord::observe`] is applied first. If
    /// the resulting count exceeds `k` the record is taken out of the tier
    /// and returned; otherwise the same node moves to the head. A restarted
    /// count never promotes.
    pub fn touch(&mut self, handle: Handle) -> HistoryTouch<K> {
        if !self.list.detach(handle) {
            return HistoryTouch::Missing;
        }

        let now = self.clock.now();
        let expiry = self.config.expiry;
        let visit = match self.list.get_mut(handle) {
            Some(record) => record.observe(now, expiry),
            None => return HistoryTouch::Missing,
        };

        match visit {
            Visit::Counted(count) if count > self.config.k => match self.list.take(handle) {
                Some(record) => HistoryTouch::Promoted(record),
                None => HistoryTouch::Missing,
            },
            visit => {
                self.list.attach(None, handle);
                HistoryTouch::Retained(visit)
            }
        }
    }
}

impl<K: Eq, C: Clock> AccessHistoryTracker<K, C> {
    /// Linear scan for the record of `key`.
    ///
    /// The manager resolves keys through its index; this is for callers
    /// that only hold the tracker.
    pub fn find(&self, key: K) -> Option<Handle> {
        let probe = AccessRecord::new(key, self.clock.now());
        self.list.find(&probe)
    }

    /// Forgets every tracked key.
    pub fn clear(&mut self) {
        self.list.clear();
    }
}

impl<K: Eq + Clone, C: Clock> AccessHistoryTracker<K, C> {
    /// Starts tracking `key` with a count of 1.
    ///
    /// If this pushes the tier past capacity, the least recently seen key is
    /// dropped and returned so the caller can forget its handle.
    pub fn record_first_sight(&mut self, key: K) -> (Handle, Option<K>) {
        let record = AccessRecord::new(key, self.clock.now());
        let handle = self.list.insert(None, record);

        let evicted = if self.list.len() > self.config.capacity.get() {
            self.list.remove_last_with(|record| record.key().clone())
        } else {
            None
        };

        (handle, evicted)
    }
}

impl<K, C> fmt::Debug for AccessHistoryTracker<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessHistoryTracker")
            .field("config", &self.config)
            .field("len", &self.list.len())
            .finish()
    }
}
