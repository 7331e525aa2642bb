use crate::config::CacheConfig;
use crate::error::Result;
use crate::keys::{CacheKey, KeyGenerator};
use crate::store::{build_store, CacheStore};
use crate::Embedding;
use std::sync::Arc;

/// Text-addressed view over a [`CacheStore`].
///
/// Every text is turned into a key by the configured [`KeyGenerator`] and the
/// store is queried with that key. Cloning is cheap; clones share the same
/// generator and store.
#[derive(Clone)]
pub struct CacheEmbeddings {
    key_generator: Arc<dyn KeyGenerator>,
    cache_store: Arc<dyn CacheStore>,
}

impl CacheEmbeddings {
    /// Combine a key generator and a store.
    ///
    /// # Arguments
    ///
    /// * `key_generator` - Maps each text to its cache key
    /// * `cache_store` - Holds the embeddings under those keys
    pub fn new(key_generator: Arc<dyn KeyGenerator>, cache_store: Arc<dyn CacheStore>) -> Self {
        Self {
            key_generator,
            cache_store,
        }
    }

    /// Build the generator and store named in `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let key_generator = config.key_generator.build();
        let cache_store = build_store(config)?;
        log::info!(
            "Embedding cache: key_generator={}, store={}",
            config.key_generator,
            config.store
        );
        Ok(Self::new(key_generator, cache_store))
    }

    /// Key `text` is stored under
    pub fn key_for(&self, text: &str) -> CacheKey {
        self.key_generator.generate_key(text)
    }

    /// Get the cached embedding for a text
    ///
    /// # Arguments
    ///
    /// * `text` - Exact text the embedding was stored for
    ///
    /// # Returns
    ///
    /// `Some(embedding)` on a hit, `None` on a miss. Backend failures are
    /// returned as errors, never as misses.
    pub async fn get(&self, text: &str) -> Result<Option<Embedding>> {
        self.get_by_key(&self.key_for(text)).await
    }

    /// Store an embedding for a text, overwriting any previous entry
    ///
    /// # Arguments
    ///
    /// * `text` - Text the embedding was computed from
    /// * `embedding` - Embedding vector to cache
    pub async fn set(&self, text: &str, embedding: &[f32]) -> Result<()> {
        self.set_by_key(&self.key_for(text), embedding).await
    }

    pub(crate) async fn get_by_key(&self, key: &CacheKey) -> Result<Option<Embedding>> {
        self.cache_store.get(key).await
    }

    pub(crate) async fn set_by_key(&self, key: &CacheKey, embedding: &[f32]) -> Result<()> {
        self.cache_store.set(key, embedding).await
    }

    /// Clear the underlying store. For Redis this flushes the whole instance.
    pub async fn clear(&self) -> Result<()> {
        self.cache_store.clear().await
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.cache_store
    }
}
