//! In-process LRU cache with per-entry expiry.
//!
//! Shared between requests behind `Arc<Mutex<..>>`. Expiry uses
//! `tokio::time::Instant`, so tests can drive it with a paused clock.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// LRU cache whose entries go stale after a fixed TTL.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: Arc<Mutex<LruCache<K, Entry<V>>>>,
    /// `None` keeps entries until evicted or invalidated.
    ttl: Option<Duration>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(name: &'static str, capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        match self.ttl {
            Some(ttl) => entry.inserted_at.elapsed() < ttl,
            None => true,
        }
    }

    /// Fresh value for `key`. Stale entries are dropped.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if self.is_fresh(entry) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        entries.pop(key);
        debug!(cache = self.name, "Evicted expired cache entry");
        None
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        entries.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry and return how many were held.
    pub async fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        debug!(cache = self.name, cleared = count, "Cache invalidated");
        count
    }

    /// Entries currently held, including stale ones not yet dropped.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new("test", 8, Some(Duration::from_secs(10)));
        cache.insert("a".to_string(), 1).await;

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ttl_never_expires() {
        let cache: TtlCache<&str, u32> = TtlCache::new("test", 8, None);
        cache.insert("a", 1).await;
        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert_eq!(cache.get(&"a").await, Some(1));
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_caching() {
        let cache: TtlCache<&str, u32> = TtlCache::new("test", 8, Some(Duration::ZERO));
        cache.insert("a", 1).await;
        assert_eq!(cache.get(&"a").await, None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache: TtlCache<&str, u32> = TtlCache::new("test", 2, None);
        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        assert_eq!(cache.get(&"a").await, Some(1));
        cache.insert("c", 3).await;

        assert_eq!(cache.get(&"b").await, None);
        assert_eq!(cache.get(&"a").await, Some(1));
        assert_eq!(cache.get(&"c").await, Some(3));
    }

    #[tokio::test]
    async fn test_invalidate_all_returns_count() {
        let cache: TtlCache<&str, u32> = TtlCache::new("test", 0, None);
        cache.insert("a", 1).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.invalidate_all().await, 1);
        assert_eq!(cache.get(&"a").await, None);
    }
}
