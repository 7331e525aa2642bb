//! Cache key derivation.
//!
//! A key generator maps a text to the key its embedding is stored under. Two
//! strategies exist: a fast in-process hash and an MD5 digest. Only the MD5
//! keys are stable across processes and machines, so persisted stores should
//! always be paired with [`Md5KeyGenerator`].

use crate::error::{CacheError, Result};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Key under which one embedding is stored.
///
/// Backends that address entries by string use the [`Display`](fmt::Display)
/// rendering: the decimal integer, or the string verbatim. `Int(5)` and
/// `Str("5")` are distinct in memory but render the same. The filesystem store
/// only accepts `Str` keys of 32 lowercase hex chars, so the two never share a
/// file there; the Redis store writes both to the Redis key `5`. Keys from a
/// single generator never mix variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Produced by [`HashKeyGenerator`]
    Int(u64),
    /// Produced by [`Md5KeyGenerator`] (32 lowercase hex chars)
    Str(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Int(n) => write!(f, "{}", n),
            CacheKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for CacheKey {
    fn from(n: u64) -> Self {
        CacheKey::Int(n)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        CacheKey::Str(s.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        CacheKey::Str(s)
    }
}

/// Derives a deterministic cache key from text content.
pub trait KeyGenerator: Send + Sync {
    fn generate_key(&self, text: &str) -> CacheKey;
}

/// SipHash-based key generator.
///
/// `DefaultHasher` is only guaranteed stable within one build of one process.
/// Use it for in-memory caches; keys written to disk or Redis by one binary
/// may not be found by another.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashKeyGenerator;

impl KeyGenerator for HashKeyGenerator {
    fn generate_key(&self, text: &str) -> CacheKey {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        CacheKey::Int(hasher.finish())
    }
}

/// MD5-based key generator. The default for every store.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5KeyGenerator;

impl KeyGenerator for Md5KeyGenerator {
    fn generate_key(&self, text: &str) -> CacheKey {
        CacheKey::Str(format!("{:x}", Md5::digest(text.as_bytes())))
    }
}

/// Closed set of key generator strategies, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyGeneratorKind {
    Hash,
    #[default]
    Md5,
}

impl KeyGeneratorKind {
    /// Construct the generator this kind names.
    pub fn build(self) -> Arc<dyn KeyGenerator> {
        match self {
            KeyGeneratorKind::Hash => Arc::new(HashKeyGenerator),
            KeyGeneratorKind::Md5 => Arc::new(Md5KeyGenerator),
        }
    }
}

impl fmt::Display for KeyGeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyGeneratorKind::Hash => f.write_str("hash"),
            KeyGeneratorKind::Md5 => f.write_str("md5"),
        }
    }
}

impl FromStr for KeyGeneratorKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(KeyGeneratorKind::Hash),
            "md5" => Ok(KeyGeneratorKind::Md5),
            other => Err(CacheError::Config(format!(
                "unknown key generator '{}' (expected 'md5' or 'hash')",
                other
            ))),
        }
    }
}
