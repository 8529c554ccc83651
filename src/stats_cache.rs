use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

use crate::clock::{Clock, elapsed_between};

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub fetched_at: SystemTime,
}

/// Single-slot memo of the last good dataset.
///
/// Staleness is advisory: a stale entry is still handed out by `get` so callers can serve it as
/// a last resort. Concurrent `put`s are last-write-wins.
pub struct TtlCache<T> {
    slot: Mutex<Option<CacheEntry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
            clock,
        }
    }

    pub fn get(&self) -> Option<T> {
        self.slot.lock().as_ref().map(|entry| entry.payload.clone())
    }

    pub fn entry(&self) -> Option<CacheEntry<T>> {
        self.slot.lock().clone()
    }

    /// Entry only if it is still inside the TTL.
    pub fn get_fresh(&self) -> Option<CacheEntry<T>> {
        let now = self.clock.now();
        let guard = self.slot.lock();
        let entry = guard.as_ref()?;
        if elapsed_between(entry.fetched_at, now) > self.ttl {
            return None;
        }
        Some(entry.clone())
    }

    pub fn put(&self, payload: T) {
        let entry = CacheEntry {
            payload,
            fetched_at: self.clock.now(),
        };
        *self.slot.lock() = Some(entry);
    }

    /// True when empty or older than the TTL.
    pub fn is_stale(&self) -> bool {
        match self.age() {
            Some(age) => age > self.ttl,
            None => true,
        }
    }

    pub fn age(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.slot
            .lock()
            .as_ref()
            .map(|entry| elapsed_between(entry.fetched_at, now))
    }

    /// Drop the slot. Returns whether anything was cached.
    pub fn clear(&self) -> bool {
        self.slot.lock().take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache_with_clock(ttl_secs: u64) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_secs(1_000));
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn empty_cache_is_stale_and_misses() {
        let (cache, _) = cache_with_clock(300);
        assert!(cache.get().is_none());
        assert!(cache.is_stale());
        assert!(cache.age().is_none());
    }

    #[test]
    fn stale_entry_is_still_returned() {
        let (cache, clock) = cache_with_clock(300);
        cache.put("snapshot".to_string());
        assert!(!cache.is_stale());

        clock.advance(Duration::from_secs(301));
        assert!(cache.is_stale());
        assert!(cache.get_fresh().is_none());
        assert_eq!(cache.get().as_deref(), Some("snapshot"));
    }

    #[test]
    fn exactly_at_ttl_is_still_fresh() {
        let (cache, clock) = cache_with_clock(300);
        cache.put("a".to_string());
        clock.advance(Duration::from_secs(300));
        assert!(!cache.is_stale());
    }

    #[test]
    fn repeated_put_only_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock(300);
        cache.put("x".to_string());
        let first = cache.entry().unwrap().fetched_at;

        clock.advance(Duration::from_secs(42));
        cache.put("x".to_string());
        let second = cache.entry().unwrap();

        assert_eq!(second.payload, "x");
        assert_eq!(elapsed_between(first, second.fetched_at), Duration::from_secs(42));
    }

    #[test]
    fn clear_reports_previous_occupancy() {
        let (cache, _) = cache_with_clock(300);
        assert!(!cache.clear());
        cache.put("x".to_string());
        assert!(cache.clear());
        assert!(cache.get().is_none());
    }
}
