//! Cache Configuration Module
//!
//! Configuration structures for the two tiers and the manager that joins
//! them. Like the rest of the crate, configs are plain structs with public
//! fields:
//!
//! - **Simple**: Just create the struct with all fields set
//! - **Type safety**: Capacities are `NonZeroUsize`, so a typed config is
//!   always valid
//!
//! When the parameters arrive as plain integers (from a settings file, a
//! command line, another language binding) use
//! [`CacheManagerConfig::new`], which validates them and reports a
//! [`ConfigError`].
//!
//! | Config | Component | Description |
//! |--------|-----------|-------------|
//! | [`HistoryConfig`] | [`AccessHistoryTracker`](crate::history::AccessHistoryTracker) | Capacity, threshold K, history window |
//! | [`PromotedCacheConfig`] | [`PromotedCache`](crate::promoted::PromotedCache) | Capacity, staleness window |
//! | [`CacheManagerConfig`] | [`CacheManager`](crate::CacheManager) | Both tiers plus the pending-read timeout |
//!
//! # Examples
//!
//! ```
//! use lruk_cache::config::{CacheManagerConfig, HistoryConfig, PromotedCacheConfig};
//! use core::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! let config = CacheManagerConfig {
//!     history: HistoryConfig {
//!         capacity: NonZeroUsize::new(10_000).unwrap(),
//!         k: 2,
//!         expiry: Duration::from_secs(60),
//!     },
//!     cache: PromotedCacheConfig {
//!         capacity: NonZeroUsize::new(1_000).unwrap(),
//!         expiry: Duration::from_secs(300),
//!     },
//!     pending_timeout: Duration::from_millis(500),
//! };
//! assert_eq!(config.history.k, 2);
//! ```

pub mod history;
pub mod manager;
pub mod promoted;

pub use history::HistoryConfig;
pub use manager::{CacheManagerConfig, DEFAULT_PENDING_TIMEOUT};
pub use promoted::PromotedCacheConfig;

/// Rejected configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The history tier must be able to hold at least one key.
    #[error("history capacity must be greater than zero")]
    ZeroHistoryCapacity,

    /// The promoted tier must be able to hold at least one entry.
    #[error("cache capacity must be greater than zero")]
    ZeroCacheCapacity,

    /// A zero history window restarts every count, so nothing is promoted.
    #[error("history expiry window must be greater than zero")]
    ZeroHistoryExpiry,

    /// A zero cache window expires every entry on its first read.
    #[error("cache expiry window must be greater than zero")]
    ZeroCacheExpiry,
}
