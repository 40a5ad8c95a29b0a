//! LRU record cache with TTL.
//!
//! Holds recently loaded store records so hot entities (session and
//! profile of an active visitor) can be pre-touched before a burst of
//! store reads. Default: 1024 entries, 60-second TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::record::StorageRecord;

/// Cache key for an entity: `index:id`.
pub fn cache_key(index: &str, id: &str) -> String {
    format!("{}:{}", index, id)
}

struct CacheEntry {
    record: StorageRecord,
    inserted_at: Instant,
}

/// Thread-safe LRU cache of store records.
pub struct EntityCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    order: Vec<String>,
    max_size: usize,
    ttl: Duration,
}

impl EntityCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: Vec::with_capacity(max_size),
                max_size,
                ttl,
            }),
        }
    }

    /// Create a cache with default settings (1024 entries, 60s TTL).
    pub fn default_cache() -> Self {
        Self::new(1024, Duration::from_secs(60))
    }

    /// Get a cached record. Returns None on miss or expired entry.
    pub fn get(&self, key: &str) -> Option<StorageRecord> {
        let mut inner = self.inner.lock();

        let expired = inner
            .entries
            .get(key)
            .map(|e| e.inserted_at.elapsed() >= inner.ttl);

        match expired {
            Some(false) => {
                let record = inner.entries.get(key).unwrap().record.clone();
                if let Some(pos) = inner.order.iter().position(|k| k == key) {
                    let key = inner.order.remove(pos);
                    inner.order.push(key);
                }
                Some(record)
            }
            Some(true) => {
                let key = key.to_string();
                inner.entries.remove(&key);
                inner.order.retain(|k| k != &key);
                None
            }
            None => None,
        }
    }

    /// Insert a record into the cache.
    pub fn put(&self, key: String, record: StorageRecord) {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            inner.entries.insert(
                key.clone(),
                CacheEntry {
                    record,
                    inserted_at: Instant::now(),
                },
            );
            inner.order.retain(|k| k != &key);
            inner.order.push(key);
            return;
        }

        // Evict oldest if at capacity
        while inner.entries.len() >= inner.max_size && !inner.order.is_empty() {
            let oldest = inner.order.remove(0);
            inner.entries.remove(&oldest);
        }

        inner.order.push(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                record,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Pre-touch hint: bump a key's recency if it is cached. Absent keys
    /// are a no-op; nothing is returned either way.
    pub fn warm(&self, key: &str) {
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(key) {
            if let Some(pos) = inner.order.iter().position(|k| k == key) {
                let key = inner.order.remove(pos);
                inner.order.push(key);
            }
        }
    }

    /// Drop a key after its backing row was rewritten.
    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.entries.remove(key);
        inner.order.retain(|k| k != key);
    }

    /// Number of entries in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &str) -> StorageRecord {
        let mut record = StorageRecord::new();
        record.insert("value".into(), serde_json::json!(value));
        record
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = EntityCache::new(10, Duration::from_secs(60));
        assert!(cache.get("profile:p1").is_none());

        cache.put("profile:p1".into(), record("a"));
        let hit = cache.get("profile:p1").unwrap();
        assert_eq!(hit["value"], serde_json::json!("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = EntityCache::new(2, Duration::from_secs(60));
        cache.put("a".into(), record("a"));
        cache.put("b".into(), record("b"));
        assert_eq!(cache.len(), 2);

        // Adding third should evict "a"
        cache.put("c".into(), record("c"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_cache_ttl_expiry() {
        let cache = EntityCache::new(10, Duration::from_millis(1));
        cache.put("ephemeral".into(), record("x"));

        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("ephemeral").is_none());
    }

    #[test]
    fn test_warm_protects_from_eviction() {
        let cache = EntityCache::new(2, Duration::from_secs(60));
        cache.put("a".into(), record("a"));
        cache.put("b".into(), record("b"));

        // Warming an absent key is a no-op
        cache.warm("nope");

        // "a" becomes most recent, so "b" is evicted next
        cache.warm("a");
        cache.put("c".into(), record("c"));
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = EntityCache::new(10, Duration::from_secs(60));
        cache.put(cache_key("profile", "p1"), record("a"));
        cache.invalidate(&cache_key("profile", "p1"));
        assert!(cache.is_empty());
    }
}
