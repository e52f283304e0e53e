//! Configuration for the access history tier.
//!
//! # Choosing `k`
//!
//! A key needs `k + 1` observations inside the window to be promoted:
//!
//! | `k` | Observations to promote | Behavior |
//! |-----|-------------------------|----------|
//! | 0   | 2 | Anything read twice is cached |
//! | 1   | 2 | Same as above, the common LRU-2 setting |
//! | 2   | 3 | Filters one-off scans and pairs |
//!
//! `k = 0` still needs a second sighting because the first sighting only
//! creates the record.

use core::fmt;
use core::num::NonZeroUsize;
use std::time::Duration;

/// Configuration for an [`AccessHistoryTracker`](crate::history::AccessHistoryTracker).
///
/// # Fields
///
/// - `capacity`: Maximum number of keys tracked before the least recently
///   seen one is forgotten.
/// - `k`: Promotion threshold; a key is promoted once its visit count
///   exceeds `k`.
/// - `expiry`: Rolling window. A gap longer than this restarts the count.
///
/// # Examples
///
/// ```
/// use lruk_cache::config::HistoryConfig;
/// use lruk_cache::history::AccessHistoryTracker;
/// use core::num::NonZeroUsize;
/// use std::time::Duration;
///
/// let config = HistoryConfig {
///     capacity: NonZeroUsize::new(4096).unwrap(),
///     k: 2,
///     expiry: Duration::from_secs(30),
/// };
/// let history: AccessHistoryTracker<String> = AccessHistoryTracker::init(config);
/// assert_eq!(history.capacity().get(), 4096);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of keys tracked.
    pub capacity: NonZeroUsize,
    /// Promotion threshold.
    pub k: usize,
    /// Window within which observations accumulate.
    pub expiry: Duration,
}

impl fmt::Debug for HistoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryConfig")
            .field("capacity", &self.capacity)
            .field("k", &self.k)
            .field("expiry", &self.expiry)
            .finish()
    }
}
