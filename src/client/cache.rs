//! Response Cache Module
//!
//! TTL-expiring storage for validated upstream responses, plus a small
//! fixed-capacity cache for the teams list and hit/miss statistics.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::client::key::RequestKey;

// == Cache Entry ==
/// A cached response plus the bookkeeping needed for lazy expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The validated response payload
    pub value: Value,
    /// When the entry was stored
    pub stored_at: Instant,
    /// How long the entry stays valid
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// An entry is valid iff `now <= stored_at + ttl`.
    pub fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

// == Cache Stats ==
/// Tracks response-cache performance.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of requests served from cache
    pub hits: u64,
    /// Number of requests that went to the network
    pub misses: u64,
}

impl CacheStats {
    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }
}

// == Response Cache ==
/// TTL cache keyed by [`RequestKey`].
///
/// No eviction policy beyond time expiry and no size bound: expired entries
/// are dropped on read, and the background sweeper handles entries nobody
/// reads again.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<RequestKey, CacheEntry>,
    stats: CacheStats,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value if present and unexpired. A read past the
    /// TTL evicts the entry and counts as a miss.
    pub fn get(&mut self, key: &RequestKey) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Stores a value, overwriting any existing entry and resetting its TTL.
    pub fn set(&mut self, key: RequestKey, value: Value, ttl: Duration) {
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Count of stored entries, including ones that would expire on the
    /// next read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}

// == Bounded Cache ==
/// Fixed-capacity cache with oldest-first eviction.
///
/// Eviction follows insertion order, not access order, and entries never
/// expire; this backs the teams list, which changes on a yearly cadence.
#[derive(Debug)]
pub struct BoundedCache<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V: Clone> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    /// Inserts a value, evicting the oldest entry when at capacity.
    pub fn set(&mut self, key: String, value: V) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, value);
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::thread::sleep;

    fn key(name: &str) -> RequestKey {
        RequestKey::new(name, &BTreeMap::new())
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = ResponseCache::new();
        cache.set(key("/games"), json!([1, 2]), Duration::from_secs(60));

        assert_eq!(cache.get(&key("/games")), Some(json!([1, 2])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing_is_miss() {
        let mut cache = ResponseCache::new();
        assert!(cache.get(&key("/games")).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_ttl_expiry_evicts_on_read() {
        let mut cache = ResponseCache::new();
        cache.set(key("/games"), json!("v"), Duration::from_millis(100));

        sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&key("/games")), Some(json!("v")));

        sleep(Duration::from_millis(100));
        assert!(cache.get(&key("/games")).is_none());
        assert_eq!(cache.len(), 0, "expired entry must be removed on read");
    }

    #[test]
    fn test_overwrite_resets_ttl() {
        let mut cache = ResponseCache::new();
        cache.set(key("/games"), json!("old"), Duration::from_millis(50));
        sleep(Duration::from_millis(30));
        cache.set(key("/games"), json!("new"), Duration::from_millis(100));
        sleep(Duration::from_millis(40));

        assert_eq!(cache.get(&key("/games")), Some(json!("new")));
    }

    #[test]
    fn test_clear() {
        let mut cache = ResponseCache::new();
        cache.set(key("/a"), json!(1), Duration::from_secs(60));
        cache.set(key("/b"), json!(2), Duration::from_secs(60));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_len_counts_stale_unread_entries() {
        let mut cache = ResponseCache::new();
        cache.set(key("/a"), json!(1), Duration::from_millis(10));
        sleep(Duration::from_millis(30));
        // Not read yet, so still counted
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let mut cache = ResponseCache::new();
        cache.set(key("/a"), json!(1), Duration::from_millis(10));
        cache.set(key("/b"), json!(2), Duration::from_secs(60));
        sleep(Duration::from_millis(30));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("/b")).is_some());
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = ResponseCache::new();
        cache.set(key("/a"), json!(1), Duration::from_secs(60));
        cache.get(&key("/a"));
        cache.get(&key("/missing"));
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_bounded_cache_oldest_first_eviction() {
        let mut cache = BoundedCache::new(2);
        cache.set("fbs".to_string(), 1);
        cache.set("fcs".to_string(), 2);
        cache.set("all".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("fbs").is_none(), "oldest entry should be evicted");
        assert_eq!(cache.get("fcs"), Some(2));
        assert_eq!(cache.get("all"), Some(3));
    }

    #[test]
    fn test_bounded_cache_overwrite_keeps_position() {
        let mut cache = BoundedCache::new(2);
        cache.set("fbs".to_string(), 1);
        cache.set("fcs".to_string(), 2);
        // Overwrite does not change insertion order
        cache.set("fbs".to_string(), 10);
        cache.set("all".to_string(), 3);

        assert!(cache.get("fbs").is_none());
        assert_eq!(cache.get("all"), Some(3));
    }
}
