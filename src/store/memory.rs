use super::CacheStore;
use crate::error::Result;
use crate::keys::CacheKey;
use crate::Embedding;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// Process-local embedding store.
///
/// Entries live as long as the store. By default the map is unbounded and an
/// entry only disappears on [`clear`](CacheStore::clear); a store built with
/// [`with_capacity`](Self::with_capacity) evicts the least recently used
/// entry once full.
pub struct InMemoryCacheStore {
    cache: Mutex<LruCache<CacheKey, Embedding>>,
}

impl InMemoryCacheStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Create a store that evicts the least recently used entry once full.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of embeddings to keep; 0 is treated as 1
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Check if the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    /// Look up `key`, marking it as recently used.
    ///
    /// # Returns
    ///
    /// A copy of the embedding if present, `None` otherwise
    async fn get(&self, key: &CacheKey) -> Result<Option<Embedding>> {
        Ok(self.cache.lock().await.get(key).cloned())
    }

    /// Store a copy of `value`, replacing any previous entry for `key`.
    async fn set(&self, key: &CacheKey, value: &[f32]) -> Result<()> {
        self.cache.lock().await.put(key.clone(), value.to_vec());
        Ok(())
    }

    /// Empties this store's map only.
    async fn clear(&self) -> Result<()> {
        self.cache.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = InMemoryCacheStore::new();
        let key = CacheKey::from("k");

        store.set(&key, &[0.5, 1.5]).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(vec![0.5, 1.5]));

        store.clear().await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_miss_is_not_an_error() {
        let store = InMemoryCacheStore::new();
        assert!(store.get(&CacheKey::Int(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = InMemoryCacheStore::new();
        let key = CacheKey::Int(1);
        store.set(&key, &[1.0]).await.unwrap();
        store.set(&key, &[2.0, 3.0]).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(vec![2.0, 3.0]));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_int_and_str_keys_are_distinct() {
        let store = InMemoryCacheStore::new();
        store.set(&CacheKey::Int(5), &[1.0]).await.unwrap();
        assert!(store.get(&CacheKey::from("5")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_only_affects_own_map() {
        let a = InMemoryCacheStore::new();
        let b = InMemoryCacheStore::new();
        let key = CacheKey::from("shared");
        a.set(&key, &[1.0]).await.unwrap();
        b.set(&key, &[2.0]).await.unwrap();

        a.clear().await.unwrap();

        assert!(a.get(&key).await.unwrap().is_none());
        assert_eq!(b.get(&key).await.unwrap(), Some(vec![2.0]));
    }

    #[tokio::test]
    async fn test_unbounded_keeps_everything() {
        let store = InMemoryCacheStore::new();
        for i in 0..1000u64 {
            store.set(&CacheKey::Int(i), &[i as f32]).await.unwrap();
        }
        assert_eq!(store.len().await, 1000);
        assert_eq!(store.get(&CacheKey::Int(0)).await.unwrap(), Some(vec![0.0]));
    }

    #[tokio::test]
    async fn test_bounded_evicts_least_recently_used() {
        let store = InMemoryCacheStore::with_capacity(2);
        store.set(&CacheKey::from("query1"), &[1.0]).await.unwrap();
        store.set(&CacheKey::from("query2"), &[2.0]).await.unwrap();

        // Touch query1 so query2 becomes the eviction candidate
        let _ = store.get(&CacheKey::from("query1")).await.unwrap();
        store.set(&CacheKey::from("query3"), &[3.0]).await.unwrap();

        assert!(store.get(&CacheKey::from("query1")).await.unwrap().is_some());
        assert!(store.get(&CacheKey::from("query2")).await.unwrap().is_none());
        assert!(store.get(&CacheKey::from("query3")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        let store = InMemoryCacheStore::with_capacity(0);
        store.set(&CacheKey::Int(1), &[1.0]).await.unwrap();
        store.set(&CacheKey::Int(2), &[2.0]).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.get(&CacheKey::Int(2)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let store = Arc::new(InMemoryCacheStore::new());
        let mut handles = Vec::new();
        for i in 0..16u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set(&CacheKey::Int(i), &[i as f32]).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len().await, 16);
    }
}
