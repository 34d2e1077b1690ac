//! Bounded in-process cache tier.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct LocalEntry {
    payload: String,
    written_at: Instant,
    ttl: Duration,
}

/// Per-replica fallback tier: serialized payloads in an LRU map behind one
/// coarse mutex. Operations are O(1) dictionary work and hold the lock
/// briefly, so whole-cache granularity is sufficient.
///
/// This tier is disposable: it is never authoritative for longer than an
/// entry's TTL, and any invalidation may empty it at will.
pub struct LocalCache {
    entries: Mutex<LruCache<String, LocalEntry>>,
}

impl LocalCache {
    pub fn new(max_entries: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(max_entries)),
        }
    }

    /// Fresh payload for `key`, promoting it to most-recently-used.
    /// Expired entries are dropped and reported as misses.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) => {
                if entry.written_at.elapsed() < entry.ttl {
                    return Some(entry.payload.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    pub fn insert(&self, key: String, payload: String, ttl: Duration) {
        self.entries.lock().put(
            key,
            LocalEntry {
                payload,
                written_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Linear filter over keys; fine for a single-process bounded map.
    pub fn remove_by_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Whether a fresh entry exists, without promoting it.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .peek(key)
            .map(|entry| entry.written_at.elapsed() < entry.ttl)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("entry_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max: usize) -> LocalCache {
        LocalCache::new(NonZeroUsize::new(max).unwrap())
    }

    #[test]
    fn insert_get_remove() {
        let local = cache(10);
        local.insert("k1".to_string(), "v1".to_string(), Duration::from_secs(60));
        assert_eq!(local.get("k1"), Some("v1".to_string()));
        assert!(local.remove("k1"));
        assert_eq!(local.get("k1"), None);
        assert!(!local.remove("k1"));
    }

    #[test]
    fn expired_entries_read_as_misses() {
        let local = cache(10);
        local.insert("k1".to_string(), "v1".to_string(), Duration::ZERO);
        assert_eq!(local.get("k1"), None);
        assert!(local.is_empty());
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let local = cache(2);
        let ttl = Duration::from_secs(60);
        local.insert("k1".to_string(), "v1".to_string(), ttl);
        local.insert("k2".to_string(), "v2".to_string(), ttl);
        // Touch k1 so k2 is the eviction candidate.
        assert!(local.get("k1").is_some());
        local.insert("k3".to_string(), "v3".to_string(), ttl);

        assert!(local.contains("k1"));
        assert!(!local.contains("k2"));
        assert!(local.contains("k3"));
    }

    #[test]
    fn remove_by_prefix_only_touches_matching_keys() {
        let local = cache(10);
        let ttl = Duration::from_secs(60);
        local.insert("a:1".to_string(), "x".to_string(), ttl);
        local.insert("a:2".to_string(), "x".to_string(), ttl);
        local.insert("b:1".to_string(), "x".to_string(), ttl);

        assert_eq!(local.remove_by_prefix("a:"), 2);
        assert!(!local.contains("a:1"));
        assert!(local.contains("b:1"));
    }
}
