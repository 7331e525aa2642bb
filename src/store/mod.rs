//! Storage backends for cached embeddings.

pub mod codec;
pub mod filesystem;
pub mod memory;
pub mod remote;

pub use filesystem::FilesystemCacheStore;
pub use memory::InMemoryCacheStore;
pub use remote::{KeyValueClient, RedisCacheStore};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::keys::{CacheKey, KeyGeneratorKind};
use crate::Embedding;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Key/value storage for embeddings.
///
/// `get` reports absence as `Ok(None)`; errors are reserved for backend
/// failures, which are returned as-is without retry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Embedding>>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &CacheKey, value: &[f32]) -> Result<()>;

    /// Remove entries. Scope depends on the backend; see each implementation.
    async fn clear(&self) -> Result<()>;
}

/// Closed set of storage backends, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    #[default]
    Filesystem,
    Redis,
}

impl StoreKind {
    /// True for backends whose entries outlive the process.
    pub fn is_persistent(self) -> bool {
        !matches!(self, StoreKind::Memory)
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Memory => f.write_str("memory"),
            StoreKind::Filesystem => f.write_str("filesystem"),
            StoreKind::Redis => f.write_str("redis"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreKind::Memory),
            "filesystem" | "fs" => Ok(StoreKind::Filesystem),
            "redis" => Ok(StoreKind::Redis),
            other => Err(CacheError::Config(format!(
                "unknown cache store '{}' (expected 'memory', 'filesystem' or 'redis')",
                other
            ))),
        }
    }
}

/// Build the store selected by `config.store`.
pub fn build_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    if config.store.is_persistent() && config.key_generator == KeyGeneratorKind::Hash {
        log::warn!(
            "Hash key generator with persistent '{}' store: keys are not stable across builds, \
             use md5",
            config.store
        );
    }

    let store: Arc<dyn CacheStore> = match config.store {
        StoreKind::Memory => {
            if config.memory.max_entries > 0 {
                Arc::new(InMemoryCacheStore::with_capacity(config.memory.max_entries))
            } else {
                Arc::new(InMemoryCacheStore::new())
            }
        }
        StoreKind::Filesystem => {
            Arc::new(FilesystemCacheStore::new(&config.filesystem.cache_dir)?)
        }
        StoreKind::Redis => {
            let url = config.redis.connection_url();
            let client = redis::Client::open(url.as_str()).map_err(|e| {
                CacheError::Config(format!("invalid redis url {}: {}", url, e))
            })?;
            Arc::new(RedisCacheStore::new(client))
        }
    };

    log::info!("Cache store ready: {}", config.store);
    Ok(store)
}
