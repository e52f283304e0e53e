//! Configuration for the promoted (value-holding) tier.

use core::fmt;
use core::num::NonZeroUsize;
use std::time::Duration;

/// Configuration for a [`PromotedCache`](crate::promoted::PromotedCache).
///
/// - `capacity`: Maximum number of promoted entries, pending or filled.
/// - `expiry`: An entry not read for longer than this is dropped on its next
///   read and the key has to earn admission again.
///
/// The window is independent of the history tier's.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PromotedCacheConfig {
    /// Maximum number of cached entries.
    pub capacity: NonZeroUsize,
    /// Staleness window.
    pub expiry: Duration,
}

impl fmt::Debug for PromotedCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromotedCacheConfig")
            .field("capacity", &self.capacity)
            .field("expiry", &self.expiry)
            .finish()
    }
}
