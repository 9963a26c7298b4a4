// Miss coalescing
//
// Deduplicates concurrent upstream fetches for the same cache key:
// - First miss (leader): fetches, stores the result, then releases its guard
// - Concurrent misses (followers): wait for the leader, then re-read the cache
// - If the leader failed, followers find nothing cached and fetch themselves

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Tracks in-flight fetches by cache key.
#[derive(Debug, Clone, Default)]
pub struct MissCoalescer {
    in_flight: Arc<Mutex<HashMap<String, watch::Sender<bool>>>>,
}

/// Outcome of [`MissCoalescer::acquire`].
#[derive(Debug)]
pub enum Slot {
    /// No fetch was in flight. Fetch, store, then drop the guard.
    Leader(LeaderGuard),
    /// Another fetch for the key has finished (successfully or not).
    Follower,
}

impl Slot {
    pub fn is_leader(&self) -> bool {
        matches!(self, Slot::Leader(_))
    }
}

/// Held by the leader; dropping it wakes every follower.
#[derive(Debug)]
pub struct LeaderGuard {
    key: String,
    in_flight: Arc<Mutex<HashMap<String, watch::Sender<bool>>>>,
}

impl MissCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &str) -> Slot {
        // Check-and-register under one lock so two misses cannot both lead
        let waiting = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(key) {
                Some(sender) => Some(sender.subscribe()),
                None => {
                    let (tx, _rx) = watch::channel(false);
                    in_flight.insert(key.to_string(), tx);
                    None
                }
            }
        };

        match waiting {
            Some(mut rx) => {
                // Err means the leader's sender is gone, which also ends the wait
                let _ = rx.wait_for(|done| *done).await;
                Slot::Follower
            }
            None => Slot::Leader(LeaderGuard {
                key: key.to_string(),
                in_flight: Arc::clone(&self.in_flight),
            }),
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        let sender = self.in_flight.lock().remove(&self.key);
        if let Some(sender) = sender {
            // No followers is fine
            let _ = sender.send(true);
        }
    }
}
