#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Admission Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                                                                          │
//! │   unseen ──get──▶ HISTORY (count=1) ──get──▶ ... ──get (count > k)──┐    │
//! │     ▲                 │                                             │    │
//! │     │           evicted for capacity                                ▼    │
//! │     ├─────────────────┘                                 CACHE (pending)  │
//! │     │                                                        │           │
//! │     │                                                       put          │
//! │     │                                                        ▼           │
//! │     │                                               CACHE (filled) ◀─┐   │
//! │     │                                                   │    │       │   │
//! │     │                                                   │   get ─────┘   │
//! │     └────── evicted for capacity, or unread > expiry ───┘                │
//! │                                                                          │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Type | Role |
//! |------|------|
//! | [`CacheManager`] | Thread-safe `get`/`put` front for both tiers |
//! | [`AccessHistoryTracker`] | Seen-but-not-admitted keys, counts visits |
//! | [`PromotedCache`] | Admitted keys with their payload slots |
//! | [`list::List`] | Arena-backed ordered list with stable handles |
//!
//! ## Basic Usage
//!
//! ```rust
//! use lruk_cache::CacheManager;
//! use std::time::Duration;
//!
//! let cache: CacheManager<String, Vec<u8>> = CacheManager::new(
//!     10_000,                  // keys remembered by the history tier
//!     1,                       // k: admit on the second sighting
//!     Duration::from_secs(30), // history window
//!     1_000,                   // values kept by the cache tier
//!     Duration::from_secs(300),
//! )
//! .unwrap();
//!
//! fn load(key: &str) -> Vec<u8> {
//!     key.as_bytes().to_vec()
//! }
//!
//! let fetch = |key: &str| match cache.get(key) {
//!     Some(value) => value,
//!     None => {
//!         let value = load(key);
//!         cache.put(key, value.clone());
//!         value
//!     }
//! };
//!
//! fetch("a"); // remembered in history
//! fetch("a"); // promoted, value stored
//! assert!(cache.contains_cached("a"));
//! assert_eq!(cache.get("a"), Some(b"a".to_vec()));
//! ```
//!
//! ## Typed Configuration
//!
//! ```rust
//! use lruk_cache::CacheManager;
//! use lruk_cache::config::{CacheManagerConfig, HistoryConfig, PromotedCacheConfig};
//! use core::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! let config = CacheManagerConfig {
//!     history: HistoryConfig {
//!         capacity: NonZeroUsize::new(4096).unwrap(),
//!         k: 2,
//!         expiry: Duration::from_secs(10),
//!     },
//!     cache: PromotedCacheConfig {
//!         capacity: NonZeroUsize::new(512).unwrap(),
//!         expiry: Duration::from_secs(60),
//!     },
//!     pending_timeout: Duration::from_millis(50),
//! };
//! let cache: CacheManager<u64, String> = CacheManager::init(config, None);
//! assert_eq!(cache.pending_timeout(), Duration::from_millis(50));
//! ```
//!
//! ## Modules
//!
//! - [`manager`]: The two-tier [`CacheManager`]
//! - [`history`]: History tier
//! - [`promoted`]: Cache tier
//! - [`entry`]: Access records and cache entries shared by both tiers
//! - [`slot`]: Pending payload handoff between `put` and waiting readers
//! - [`list`]: Ordered list with generational handles
//! - [`clock`]: Time sources
//! - [`config`]: Configuration structures
//! - [`metrics`]: Counters and reporting

/// Time sources used for visit counting and staleness.
pub mod clock;

/// Arena-backed doubly linked list with generational handles.
///
/// Both tiers keep their entries in a [`List`](list::List). Side indices in
/// the manager store [`Handle`](list::Handle)s, which become stale instead of
/// dangling once their node is removed.
pub mod list;

/// Access records and cache entries.
pub mod entry;

/// Completion signal for pending payloads.
pub mod slot;

/// Configuration structures.
pub mod config;

/// Cache metrics system.
///
/// Each tier keeps its own counters; the manager reports them together
/// through the [`CacheMetrics`](metrics::CacheMetrics) trait.
pub mod metrics;

/// History tier: keys seen but not yet admitted.
pub mod history;

/// Cache tier: admitted keys and their payloads.
pub mod promoted;

/// The thread-safe manager joining both tiers.
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheManagerConfig, ConfigError, HistoryConfig, PromotedCacheConfig};
pub use entry::{AccessRecord, CacheEntry};
pub use history::AccessHistoryTracker;
pub use manager::CacheManager;
pub use metrics::{CacheMetrics, LrukCacheMetrics};
pub use promoted::PromotedCache;
