//! Embedding cache: never compute the same text's embedding twice.
//!
//! A [`KeyGenerator`](keys::KeyGenerator) turns text into a key, a
//! [`CacheStore`](store::CacheStore) holds embeddings by key, and
//! [`CachedProvider`](embeddings::CachedProvider) wraps any batch
//! [`EmbeddingProvider`](embeddings::EmbeddingProvider) so that only texts
//! missing from the cache reach it.

pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod keys;
pub mod store;

pub use cache::CacheEmbeddings;
pub use config::Config;
pub use embeddings::{CachedProvider, EmbeddingProvider};
pub use error::{CacheError, Result};
pub use keys::{CacheKey, HashKeyGenerator, KeyGenerator, Md5KeyGenerator};
pub use store::{CacheStore, FilesystemCacheStore, InMemoryCacheStore, RedisCacheStore};

/// An embedding vector. Stored and returned unchanged.
pub type Embedding = Vec<f32>;
