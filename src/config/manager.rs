//! Configuration for the [`CacheManager`](crate::CacheManager).
//!
//! # Sizing Guidelines
//!
//! The history tier only stores keys and two counters, so it is cheap to make
//! it several times larger than the cache tier. A history that is too small
//! forgets keys before they reach the threshold, and nothing gets promoted:
//!
//! ```text
//! history.capacity ≳ distinct keys seen per history.expiry window
//! cache.capacity   = number of values you can afford to keep in memory
//! ```

use super::{ConfigError, HistoryConfig, PromotedCacheConfig};
use core::fmt;
use core::num::NonZeroUsize;
use std::time::Duration;

/// How long a read waits for the payload of a freshly promoted entry.
pub const DEFAULT_PENDING_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuration for a [`CacheManager`](crate::CacheManager).
///
/// # Examples
///
/// ```
/// use lruk_cache::config::{CacheManagerConfig, ConfigError};
/// use std::time::Duration;
///
/// let config = CacheManagerConfig::new(
///     1024,                       // history capacity
///     2,                          // k
///     Duration::from_secs(10),    // history window
///     128,                        // cache capacity
///     Duration::from_secs(60),    // cache window
/// )
/// .unwrap();
/// assert_eq!(config.cache.capacity.get(), 128);
///
/// let err = CacheManagerConfig::new(0, 2, Duration::from_secs(1), 1, Duration::from_secs(1));
/// assert_eq!(err.unwrap_err(), ConfigError::ZeroHistoryCapacity);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CacheManagerConfig {
    /// History tier settings.
    pub history: HistoryConfig,
    /// Cache tier settings.
    pub cache: PromotedCacheConfig,
    /// Bound on how long `get` waits for a pending payload.
    pub pending_timeout: Duration,
}

impl CacheManagerConfig {
    /// Builds a config from plain parameters, using
    /// [`DEFAULT_PENDING_TIMEOUT`].
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
        let history_capacity =
            NonZeroUsize::new(history_capacity).ok_or(ConfigError::ZeroHistoryCapacity)?;
        let cache_capacity =
            NonZeroUsize::new(cache_capacity).ok_or(ConfigError::ZeroCacheCapacity)?;
        if history_expiry.is_zero() {
            return Err(ConfigError::ZeroHistoryExpiry);
        }
        if cache_expiry.is_zero() {
            return Err(ConfigError::ZeroCacheExpiry);
        }

        Ok(Self {
            history: HistoryConfig {
                capacity: history_capacity,
                k,
                expiry: history_expiry,
            },
            cache: PromotedCacheConfig {
                capacity: cache_capacity,
                expiry: cache_expiry,
            },
            pending_timeout: DEFAULT_PENDING_TIMEOUT,
        })
    }

    /// Replaces the pending-read timeout.
    #[must_use]
    pub fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = timeout;
        self
    }
}

impl fmt::Debug for CacheManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManagerConfig")
            .field("history", &self.history)
            .field("cache", &self.cache)
            .field("pending_timeout", &self.pending_timeout)
            .finish()
    }
}
