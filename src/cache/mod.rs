//! Bounded in-memory audio cache keyed by catalog song id.
//!
//! Eviction is strict FIFO by first insertion. The backing `LruCache` is only
//! ever touched through the non-promoting calls (`peek`, `peek_mut`,
//! `contains`), so its recency order stays equal to insertion order.

use axum::body::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug)]
pub struct FetchCache {
    entries: Mutex<LruCache<String, Bytes>>,
}

impl FetchCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.entries().peek(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains(key)
    }

    /// Insert or overwrite `key`. Returns the key evicted to make room, if any.
    ///
    /// Overwriting keeps the entry's original position in the eviction order.
    pub fn put(&self, key: &str, bytes: Bytes) -> Option<String> {
        let mut entries = self.entries();
        if let Some(slot) = entries.peek_mut(key) {
            *slot = bytes;
            return None;
        }
        let evicted = entries.push(key.to_string(), bytes).map(|(k, _)| k);
        if let Some(k) = &evicted {
            tracing::debug!(evicted = %k, inserted = %key, "cache full, dropped oldest entry");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }

    /// Cached ids, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.entries().iter().rev().map(|(k, _)| k.clone()).collect()
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Bytes>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cache(cap: usize) -> FetchCache {
        FetchCache::new(NonZeroUsize::new(cap).unwrap())
    }

    fn body(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_put_then_get_returns_same_bytes() {
        let c = cache(3);
        let data = Bytes::from(vec![0u8, 255, 1, 254, 7]);
        c.put("ZW6BZ0A8", data.clone());
        assert_eq!(c.get("ZW6BZ0A8"), Some(data));
        assert_eq!(c.get("missing"), None);
    }

    #[test]
    fn test_fifo_eviction_drops_first_inserted() {
        let c = cache(DEFAULT_CAPACITY);
        for i in 1..=DEFAULT_CAPACITY + 1 {
            c.put(&format!("k{i}"), body("x"));
            assert!(c.len() <= DEFAULT_CAPACITY);
        }
        assert!(!c.contains("k1"));
        for i in 2..=DEFAULT_CAPACITY + 1 {
            assert!(c.contains(&format!("k{i}")), "k{i} should be resident");
        }
        assert_eq!(c.len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_put_returns_evicted_key() {
        let c = cache(2);
        assert_eq!(c.put("a", body("1")), None);
        assert_eq!(c.put("b", body("2")), None);
        assert_eq!(c.put("c", body("3")), Some("a".to_string()));
    }

    #[test]
    fn test_overwrite_keeps_insertion_position() {
        let c = cache(2);
        c.put("a", body("1"));
        c.put("b", body("2"));
        assert_eq!(c.put("a", body("1-new")), None);
        assert_eq!(c.get("a"), Some(body("1-new")));

        c.put("c", body("3"));
        assert!(!c.contains("a"));
        assert_eq!(c.keys(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_get_does_not_postpone_eviction() {
        let c = cache(2);
        c.put("a", body("1"));
        c.put("b", body("2"));
        for _ in 0..5 {
            assert!(c.get("a").is_some());
        }
        c.put("c", body("3"));
        assert!(c.get("a").is_none());
    }

    #[test]
    fn test_keys_oldest_first() {
        let c = cache(4);
        for k in ["x", "y", "z"] {
            c.put(k, body(k));
        }
        assert_eq!(c.keys(), vec!["x", "y", "z"]);
        assert_eq!(c.capacity(), 4);
    }

    #[test]
    fn test_concurrent_puts_respect_capacity() {
        let c = Arc::new(cache(5));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        // Overlapping keys across threads exercise the overwrite path.
                        c.put(&format!("song-{}", (t * 7 + i) % 20), body("pcm"));
                        let _ = c.get(&format!("song-{}", i % 20));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.len(), 5);
        assert_eq!(c.keys().len(), 5);
    }
}
