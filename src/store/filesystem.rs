use super::codec::{decode_embedding, encode_embedding};
use super::CacheStore;
use crate::error::{CacheError, Result};
use crate::keys::CacheKey;
use crate::Embedding;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Extension of entry files
const ENTRY_EXTENSION: &str = "emb";

/// Default directory used when none is configured
pub const DEFAULT_CACHE_DIR: &str = "./cache";

/// Embedding store persisted as one file per key.
///
/// Entries are written to `<cache_dir>/<key>.emb` as raw little-endian f32
/// values, so they survive restarts and can be shared between processes that
/// use the same key generator (use MD5 keys for that). Writes go to a
/// temporary file first and are renamed into place, so readers never observe a
/// partially written entry.
///
/// Only keys in the shape the built-in generators produce are accepted: a
/// [`CacheKey::Int`], or a [`CacheKey::Str`] of 32 lowercase hex chars. The
/// two renderings cannot collide on disk, and `clear` can tell this store's
/// files apart from anything else in `cache_dir` by name alone.
pub struct FilesystemCacheStore {
    cache_dir: PathBuf,
    /// Serializes writes and clears issued through this store
    write_lock: Mutex<()>,
}

impl FilesystemCacheStore {
    /// Open a store rooted at `cache_dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir)?;
        log::debug!("Filesystem cache at {}", cache_dir.display());
        Ok(Self {
            cache_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> Result<PathBuf> {
        let name = file_stem(key)?;
        Ok(self
            .cache_dir
            .join(format!("{}.{}", name, ENTRY_EXTENSION)))
    }

    fn temp_path(&self, key: &CacheKey) -> Result<PathBuf> {
        let name = file_stem(key)?;
        let nonce = uuid::Uuid::new_v4().simple();
        Ok(self.cache_dir.join(format!(".{}.{}.tmp", name, nonce)))
    }
}

/// File name stem for `key`, or `InvalidKey` if no generator produces it.
fn file_stem(key: &CacheKey) -> Result<String> {
    match key {
        CacheKey::Int(n) => Ok(n.to_string()),
        CacheKey::Str(s) if is_md5_hex(s) => Ok(s.clone()),
        CacheKey::Str(s) => Err(CacheError::InvalidKey(format!(
            "'{}' is not a key the filesystem store accepts (expected 32 lowercase hex chars)",
            s.escape_debug()
        ))),
    }
}

fn is_md5_hex(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_key_stem(stem: &str) -> bool {
    is_md5_hex(stem) || stem.parse::<u64>().is_ok_and(|n| n.to_string() == stem)
}

/// True for `<key>.emb` entries and `.<key>.<nonce>.tmp` leftovers written by
/// this store.
fn is_store_file(name: &str) -> bool {
    if let Some(stem) = name
        .strip_suffix(ENTRY_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
    {
        return is_key_stem(stem);
    }
    let Some(inner) = name
        .strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(".tmp"))
    else {
        return false;
    };
    match inner.split_once('.') {
        Some((stem, nonce)) => is_key_stem(stem) && is_md5_hex(nonce),
        None => false,
    }
}

#[async_trait]
impl CacheStore for FilesystemCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Embedding>> {
        let path = self.entry_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => decode_embedding(&key.to_string(), &bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &CacheKey, value: &[f32]) -> Result<()> {
        let path = self.entry_path(key)?;
        let temp_path = self.temp_path(key)?;
        let bytes = encode_embedding(value);

        let _guard = self.write_lock.lock().await;
        let written = match tokio::fs::write(&temp_path, &bytes).await {
            Ok(()) => tokio::fs::rename(&temp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    log::warn!(
                        "Failed to remove temp file {}: {}",
                        temp_path.display(),
                        cleanup
                    );
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Removes the entry files and leftover temp files this store writes, and
    /// nothing else.
    ///
    /// A missing directory is recreated and treated as already clear. A
    /// read-only directory is reported as [`CacheError::NotWritable`].
    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let metadata = match tokio::fs::metadata(&self.cache_dir).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&self.cache_dir).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_dir() {
            return Err(CacheError::Config(format!(
                "cache path is not a directory: {}",
                self.cache_dir.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(CacheError::NotWritable(self.cache_dir.clone()));
        }

        let mut removed = 0usize;
        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let owned = entry.file_name().to_str().is_some_and(is_store_file);
            if !owned || !entry.file_type().await?.is_file() {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    return Err(CacheError::NotWritable(self.cache_dir.clone()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::info!(
            "Cleared {} cache files from {}",
            removed,
            self.cache_dir.display()
        );
        Ok(())
    }
}
