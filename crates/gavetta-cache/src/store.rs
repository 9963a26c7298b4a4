use crate::clock::SystemClock;
use crate::key::CacheKey;
use crate::traits::{CacheEntry, CacheStats, Clock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Sizing for a [`ResponseStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of resident entries.
    pub max_entries: usize,
    /// How many of the oldest entries to drop once `max_entries` is reached.
    pub evict_batch: usize,
}

impl StoreConfig {
    pub fn new(max_entries: usize, evict_batch: usize) -> Self {
        assert!(max_entries > 0, "store capacity must be > 0");
        Self {
            max_entries,
            // A zero batch would let the store grow without bound.
            evict_batch: evict_batch.clamp(1, max_entries),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(500, 100)
    }
}

struct Inner<V> {
    map: HashMap<CacheKey, CacheEntry<V>, ahash::RandomState>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    expirations: u64,
    evictions: u64,
}

/// Process-wide response store with read-time TTL and bulk eviction.
///
/// The TTL is not stored with the entry; each read supplies the freshness
/// window it wants, and a read that finds the entry too old deletes it. There
/// is no background sweep.
///
/// When an insert finds the store full, the `evict_batch` entries with the
/// oldest `stored_at` are removed in one pass before the new entry goes in.
///
/// Each operation runs under a short mutex critical section. A
/// get → fetch → set sequence spanning an upstream call is *not* atomic, so
/// two concurrent misses on one key may both write; the second write simply
/// replaces the first.
pub struct ResponseStore<V> {
    inner: Mutex<Inner<V>>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl<V> ResponseStore<V> {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                // Grows with use; max_entries is only an upper bound
                map: HashMap::with_hasher(ahash::RandomState::new()),
                next_seq: 0,
                hits: 0,
                misses: 0,
                expirations: 0,
                evictions: 0,
            }),
            config,
            clock,
        }
    }

    /// Return the payload for `key` if it was stored no more than `ttl` ago.
    pub fn get(&self, key: &CacheKey, ttl: Duration) -> Option<Arc<V>> {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        let found = inner
            .map
            .get(key)
            .map(|entry| (entry.is_fresh(now, ttl), Arc::clone(&entry.payload)));

        let fresh = match found {
            Some((true, payload)) => Some(payload),
            Some((false, _)) => {
                // Lazy expiration: drop the stale entry on the read that saw it
                inner.map.remove(key);
                inner.expirations += 1;
                None
            }
            None => None,
        };

        if fresh.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        fresh
    }

    /// Store `payload` under `key`, replacing any previous entry.
    pub fn set(&self, key: CacheKey, payload: Arc<V>) {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        if inner.map.len() >= self.config.max_entries {
            let evicted = Self::evict_oldest(&mut inner, self.config.evict_batch);
            inner.evictions += evicted as u64;
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.map.insert(
            key,
            CacheEntry {
                payload,
                stored_at: now,
                seq,
            },
        );
    }

    /// Remove the `batch` entries with the smallest `(stored_at, seq)`.
    fn evict_oldest(inner: &mut Inner<V>, batch: usize) -> usize {
        let mut ranked: Vec<(u64, u64, CacheKey)> = inner
            .map
            .iter()
            .map(|(k, e)| (e.stored_at, e.seq, k.clone()))
            .collect();

        let batch = batch.min(ranked.len());
        if batch == 0 {
            return 0;
        }
        if batch < ranked.len() {
            // (stored_at, seq) is unique, so the partition is exact
            ranked.select_nth_unstable_by_key(batch - 1, |(at, seq, _)| (*at, *seq));
        }

        for (_, _, key) in ranked.into_iter().take(batch) {
            inner.map.remove(&key);
        }
        batch
    }

    /// `stored_at` of the entry under `key`, fresh or not.
    pub fn stored_at(&self, key: &CacheKey) -> Option<u64> {
        self.inner.lock().map.get(key).map(|e| e.stored_at)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            expirations: inner.expirations,
            evictions: inner.evictions,
            current_size: inner.map.len(),
            capacity: self.config.max_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const MINUTE: Duration = Duration::from_secs(60);

    fn key(i: usize) -> CacheKey {
        CacheKey::derive("searchMovies", [("query", i.to_string())])
    }

    fn store(max: usize, batch: usize) -> (ResponseStore<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = ResponseStore::with_clock(StoreConfig::new(max, batch), clock.clone());
        (store, clock)
    }

    #[test]
    fn basic_set_and_get() {
        let (store, _) = store(10, 2);
        store.set(key(1), Arc::new("one".into()));

        assert_eq!(store.get(&key(1), MINUTE).as_deref(), Some(&"one".to_string()));
        assert!(store.get(&key(2), MINUTE).is_none());
    }

    #[test]
    fn ttl_boundary_is_inclusive() {
        let (store, clock) = store(10, 2);
        let ttl = Duration::from_secs(300);
        store.set(key(1), Arc::new("x".into()));

        clock.advance(ttl - Duration::from_millis(1));
        assert!(store.get(&key(1), ttl).is_some());

        clock.advance(Duration::from_millis(1));
        assert!(store.get(&key(1), ttl).is_some(), "exactly ttl old is still fresh");

        clock.advance(Duration::from_millis(1));
        assert!(store.get(&key(1), ttl).is_none());
    }

    #[test]
    fn stale_read_purges_entry() {
        let (store, clock) = store(10, 2);
        let ttl = Duration::from_secs(300);
        store.set(key(1), Arc::new("x".into()));

        clock.advance(ttl + Duration::from_millis(1));
        assert!(store.get(&key(1), ttl).is_none());
        assert!(!store.contains(&key(1)));

        // Even a longer window cannot resurrect it
        assert!(store.get(&key(1), Duration::from_secs(86_400)).is_none());
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn ttl_is_chosen_per_read() {
        let (store, clock) = store(10, 2);
        store.set(key(1), Arc::new("x".into()));
        clock.advance(Duration::from_secs(600));

        // Fresh under a one hour window
        assert!(store.get(&key(1), Duration::from_secs(3600)).is_some());
        // Stale under five minutes, and purged
        assert!(store.get(&key(1), Duration::from_secs(300)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn set_replaces_entry_and_timestamp() {
        let (store, clock) = store(10, 2);
        store.set(key(1), Arc::new("old".into()));
        let first = store.stored_at(&key(1)).unwrap();

        clock.advance(MINUTE);
        store.set(key(1), Arc::new("new".into()));

        assert_eq!(store.len(), 1);
        assert_eq!(store.stored_at(&key(1)), Some(first + 60_000));
        assert_eq!(store.get(&key(1), MINUTE).as_deref(), Some(&"new".to_string()));
    }

    #[test]
    fn eviction_drops_exactly_the_oldest_batch() {
        let (store, clock) = store(500, 100);

        for i in 0..500 {
            store.set(key(i), Arc::new(i.to_string()));
            clock.advance(Duration::from_millis(1));
            assert!(store.len() <= 500);
        }
        assert_eq!(store.len(), 500);

        store.set(key(500), Arc::new("500".into()));
        assert_eq!(store.len(), 401);

        for i in 0..100 {
            assert!(!store.contains(&key(i)), "key {i} should have been evicted");
        }
        for i in 100..=500 {
            assert!(store.contains(&key(i)), "key {i} should be resident");
        }
        assert_eq!(store.stats().evictions, 100);
    }

    #[test]
    fn eviction_ranks_by_stored_at_not_insertion() {
        let (store, clock) = store(3, 1);
        store.set(key(1), Arc::new("1".into()));
        clock.advance(MINUTE);
        store.set(key(2), Arc::new("2".into()));
        clock.advance(MINUTE);
        store.set(key(3), Arc::new("3".into()));
        clock.advance(MINUTE);

        // Refresh key 1, so key 2 becomes the oldest
        store.set(key(1), Arc::new("1b".into()));
        store.set(key(4), Arc::new("4".into()));

        assert!(!store.contains(&key(2)));
        assert!(store.contains(&key(1)));
        assert!(store.contains(&key(3)));
        assert!(store.contains(&key(4)));
    }

    #[test]
    fn equal_timestamps_evict_in_insertion_order() {
        let (store, _) = store(4, 2);
        for i in 0..4 {
            store.set(key(i), Arc::new(i.to_string()));
        }
        store.set(key(9), Arc::new("9".into()));

        assert!(!store.contains(&key(0)));
        assert!(!store.contains(&key(1)));
        assert!(store.contains(&key(2)));
        assert!(store.contains(&key(3)));
        assert!(store.contains(&key(9)));
    }

    #[test]
    fn zero_batch_is_clamped() {
        let config = StoreConfig::new(2, 0);
        assert_eq!(config.evict_batch, 1);

        let (store, _) = store(2, 0);
        for i in 0..10 {
            store.set(key(i), Arc::new(i.to_string()));
        }
        assert!(store.len() <= 2);
    }

    #[test]
    fn stats_tracking() {
        let (store, clock) = store(2, 1);
        store.set(key(1), Arc::new("1".into()));
        store.get(&key(1), MINUTE); // hit
        store.get(&key(2), MINUTE); // miss
        store.set(key(2), Arc::new("2".into()));
        store.set(key(3), Arc::new("3".into())); // eviction
        clock.advance(MINUTE * 2);
        store.get(&key(3), MINUTE); // expired miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.current_size, 1);
        assert_eq!(stats.capacity, 2);
        assert!((stats.hit_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn huge_capacity_allocates_lazily() {
        let (store, _) = store(usize::MAX / 2, 1);
        for i in 0..3 {
            store.set(key(i), Arc::new(i.to_string()));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.stats().capacity, usize::MAX / 2);
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn zero_capacity_rejected() {
        StoreConfig::new(0, 1);
    }
}
