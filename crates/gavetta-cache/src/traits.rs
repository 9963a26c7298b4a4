use std::sync::Arc;
use std::time::Duration;

/// One stored payload plus the moment it was written.
///
/// Entries are never mutated in place: a re-fetch replaces the whole entry
/// under the same key.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub payload: Arc<V>,
    /// Milliseconds since the Unix epoch.
    pub stored_at: u64,
    /// Insertion sequence, breaks `stored_at` ties when ranking for eviction.
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    /// Age of the entry at `now_ms`. A clock that went backwards reads as zero.
    pub fn age(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.stored_at))
    }

    pub fn is_fresh(&self, now_ms: u64, ttl: Duration) -> bool {
        self.age(now_ms) <= ttl
    }
}

/// Snapshot of store statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped by a read that found them stale.
    pub expirations: u64,
    /// Entries dropped by size pressure.
    pub evictions: u64,
    pub current_size: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Source of wall-clock time for the store.
///
/// The store only ever asks for "now" in epoch milliseconds, so tests can
/// substitute a clock they drive by hand.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}
