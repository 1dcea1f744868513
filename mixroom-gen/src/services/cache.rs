//! In-memory TTL cache for catalog responses
//!
//! Read-recompute-write per key with last-writer-wins semantics: a
//! duplicated population race between near-simultaneous callers is
//! harmless because chart data is interchangeable within one TTL
//! window.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Chart lookups change slowly; refetch hourly
pub const TTL_CHARTS: Duration = Duration::from_secs(60 * 60);
/// Similar-artist relations are near-static
pub const TTL_SIMILAR_ARTISTS: Duration = Duration::from_secs(24 * 60 * 60);
/// An artist's top tracks drift slowly
pub const TTL_TOP_TRACKS: Duration = Duration::from_secs(12 * 60 * 60);
/// Track search results
pub const TTL_SEARCH: Duration = Duration::from_secs(30 * 60);

/// Time-boxed cache keyed by `K`, safe for concurrent use
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, (Instant, V)>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch a fresh entry, or None when missing or expired
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .and_then(|(stored_at, value)| (stored_at.elapsed() < self.ttl).then(|| value.clone()))
    }

    /// Store an entry, replacing any previous one for the key
    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        // Expired entries for other keys are left in place; they are
        // revalidated on read and the key space is small (chart types)
        entries.insert(key, (Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_fresh_entry() {
        let cache: TtlCache<String, Vec<u32>> = TtlCache::new(Duration::from_secs(60));
        cache.insert("charts".to_string(), vec![1, 2, 3]).await;

        assert_eq!(cache.get(&"charts".to_string()).await, Some(vec![1, 2, 3]));
        assert_eq!(cache.get(&"other".to_string()).await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_missed() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(20));
        cache.insert("key", 1).await;
        assert_eq!(cache.get(&"key").await, Some(1));

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"key").await, None);
    }

    #[tokio::test]
    async fn test_insert_overwrites_last_writer_wins() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("key", 1).await;
        cache.insert("key", 2).await;
        assert_eq!(cache.get(&"key").await, Some(2));
    }
}
