use super::provider::EmbeddingProvider;
use crate::cache::CacheEmbeddings;
use crate::error::{CacheError, Result};
use crate::keys::CacheKey;
use crate::Embedding;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters for a [`CachedProvider`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub provider_calls: u64,
}

/// An embedding provider that consults a cache before calling the wrapped one.
///
/// Each text is looked up by its key. Texts that miss are sent to the inner
/// provider in a single batch, in their original relative order, and every
/// embedding it returns is written to the cache before the call completes.
/// The result always lines up with the input: `result[i]` is the embedding of
/// `texts[i]`, whether it came from the cache or the provider.
///
/// If the provider fails nothing is written and the error is returned as-is.
/// There is no de-duplication across concurrent calls, so two callers missing
/// on the same text will both compute it and the last write wins.
pub struct CachedProvider<P> {
    inner: P,
    cache: CacheEmbeddings,
    hits: AtomicU64,
    misses: AtomicU64,
    provider_calls: AtomicU64,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: CacheEmbeddings) -> Self {
        Self {
            inner,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            provider_calls: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &CacheEmbeddings {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut results: Vec<Option<Embedding>> = Vec::with_capacity(texts.len());
        let mut miss_slots: Vec<(usize, CacheKey)> = Vec::new();
        let mut miss_texts: Vec<String> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = self.cache.key_for(text);
            match self.cache.get_by_key(&key).await? {
                Some(cached) => results.push(Some(cached)),
                None => {
                    results.push(None);
                    miss_slots.push((i, key));
                    miss_texts.push(text.clone());
                }
            }
        }

        let hit_count = texts.len() - miss_texts.len();
        self.hits.fetch_add(hit_count as u64, Ordering::Relaxed);
        self.misses
            .fetch_add(miss_texts.len() as u64, Ordering::Relaxed);

        if miss_texts.is_empty() {
            log::debug!("Embedding cache: all {} texts cached", texts.len());
            return Ok(results.into_iter().flatten().collect());
        }

        log::debug!(
            "Embedding cache: {} hits, {} misses; calling provider",
            hit_count,
            miss_texts.len()
        );
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        let computed = self.inner.embed_batch(&miss_texts).await?;

        if computed.len() != miss_texts.len() {
            return Err(CacheError::ProviderMismatch {
                expected: miss_texts.len(),
                actual: computed.len(),
            });
        }

        for ((slot, key), embedding) in miss_slots.into_iter().zip(computed) {
            self.cache.set_by_key(&key, &embedding).await?;
            results[slot] = Some(embedding);
        }

        // Every slot is filled: hits above, misses in the loop.
        Ok(results.into_iter().flatten().collect())
    }
}
