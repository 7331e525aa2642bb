use super::codec::{decode_embedding, encode_embedding};
use super::CacheStore;
use crate::error::{CacheError, Result};
use crate::keys::CacheKey;
use crate::Embedding;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// The three commands the remote store needs from a key-value service.
#[async_trait]
pub trait KeyValueClient: Send + Sync {
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Drop every key in every database of the connected instance.
    async fn flush_all(&self) -> Result<()>;
}

async fn set_on(con: &mut MultiplexedConnection, key: &str, value: Vec<u8>) -> Result<()> {
    con.set::<_, _, ()>(key, value).await?;
    Ok(())
}

async fn get_on(con: &mut MultiplexedConnection, key: &str) -> Result<Option<Vec<u8>>> {
    let raw: Option<Vec<u8>> = con.get(key).await?;
    Ok(raw)
}

async fn flush_on(con: &mut MultiplexedConnection) -> Result<()> {
    redis::cmd("FLUSHALL").query_async::<()>(con).await?;
    Ok(())
}

#[async_trait]
impl KeyValueClient for redis::Client {
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut con = self.get_multiplexed_async_connection().await?;
        set_on(&mut con, key, value).await
    }

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut con = self.get_multiplexed_async_connection().await?;
        get_on(&mut con, key).await
    }

    async fn flush_all(&self) -> Result<()> {
        let mut con = self.get_multiplexed_async_connection().await?;
        flush_on(&mut con).await
    }
}

#[async_trait]
impl KeyValueClient for MultiplexedConnection {
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        set_on(&mut self.clone(), key, value).await
    }

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        get_on(&mut self.clone(), key).await
    }

    async fn flush_all(&self) -> Result<()> {
        flush_on(&mut self.clone()).await
    }
}

/// Embedding store backed by Redis (or any Redis-compatible service).
///
/// Keys are written verbatim with no prefix, so several processes sharing
/// MD5 keys share one cache.
///
/// # Hazard
///
/// [`clear`](CacheStore::clear) issues `FLUSHALL`. It deletes every key on
/// the connected server, including keys this store never wrote and keys in
/// other logical databases. Point this store at a dedicated instance.
pub struct RedisCacheStore<C = redis::Client> {
    client: C,
}

impl<C: KeyValueClient> RedisCacheStore<C> {
    /// Wrap a pre-configured client or connection.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl RedisCacheStore<redis::Client> {
    /// Create a store from a Redis URL such as `redis://localhost:6379/0`.
    /// No connection is made until the first command.
    pub fn from_url(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Config(format!("invalid redis url {}: {}", url, e)))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl<C: KeyValueClient> CacheStore for RedisCacheStore<C> {
    async fn get(&self, key: &CacheKey) -> Result<Option<Embedding>> {
        let redis_key = key.to_string();
        match self.client.get_bytes(&redis_key).await? {
            Some(blob) => decode_embedding(&redis_key, &blob).map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &[f32]) -> Result<()> {
        self.client
            .set_bytes(&key.to_string(), encode_embedding(value))
            .await
    }

    async fn clear(&self) -> Result<()> {
        log::warn!("Flushing the entire Redis instance (FLUSHALL)");
        self.client.flush_all().await
    }
}
