use crate::keys::KeyGeneratorKind;
use crate::store::filesystem::DEFAULT_CACHE_DIR;
use crate::store::StoreKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "EMBEDCACHE_CONFIG";

/// Config file used when `EMBEDCACHE_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "embedcache.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Which key generator and store to use, plus per-store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub key_generator: KeyGeneratorKind,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default)]
    pub memory: MemoryStoreConfig,
    #[serde(default)]
    pub filesystem: FilesystemStoreConfig,
    #[serde(default)]
    pub redis: RedisStoreConfig,
}

/// In-memory store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStoreConfig {
    /// 0 keeps every entry; anything else bounds the store with LRU eviction
    #[serde(default)]
    pub max_entries: usize,
}

/// Filesystem store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemStoreConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for FilesystemStoreConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
        }
    }
}

/// Redis store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    /// Full connection URL; takes precedence over host/port/db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            db: 0,
            url: None,
        }
    }
}

impl RedisStoreConfig {
    /// URL handed to the Redis client
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in EMBEDCACHE_CONFIG environment variable
    /// 2. ./embedcache.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_path(Self::config_path())
    }

    /// Like [`Config::load`], but falls back to defaults when the config file
    /// does not exist.
    pub fn load_or_default() -> Result<Self> {
        let _ = dotenv::dotenv();
        let path = Self::config_path();
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    /// Load and validate a specific config file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&config_str)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn config_path() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.cache.filesystem.cache_dir.as_os_str().is_empty() {
            anyhow::bail!("cache.filesystem.cache_dir must not be empty");
        }

        if self.cache.redis.url.is_none() && self.cache.redis.host.trim().is_empty() {
            anyhow::bail!("cache.redis.host must not be empty");
        }

        if self.cache.redis.db < 0 {
            anyhow::bail!("cache.redis.db must not be negative");
        }

        if self.logging.level.parse::<log::LevelFilter>().is_err() {
            anyhow::bail!(
                "logging.level '{}' is not one of off, error, warn, info, debug, trace",
                self.logging.level
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn with_config_env(config_path: &Path, f: impl FnOnce()) {
        let original = std::env::var(CONFIG_ENV).ok();
        std::env::set_var(CONFIG_ENV, config_path);
        f();
        std::env::remove_var(CONFIG_ENV);
        if let Some(val) = original {
            std::env::set_var(CONFIG_ENV, val);
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.key_generator, KeyGeneratorKind::Md5);
        assert_eq!(config.cache.store, StoreKind::Filesystem);
        assert_eq!(config.cache.filesystem.cache_dir, PathBuf::from("./cache"));
        assert_eq!(config.cache.memory.max_entries, 0);
        assert_eq!(
            config.cache.redis.connection_url(),
            "redis://localhost:6379/0"
        );
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[logging]
level = "debug"

[cache]
key_generator = "hash"
store = "memory"

[cache.memory]
max_entries = 500

[cache.redis]
host = "cache.internal"
port = 6380
db = 2
"#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.cache.key_generator, KeyGeneratorKind::Hash);
        assert_eq!(config.cache.store, StoreKind::Memory);
        assert_eq!(config.cache.memory.max_entries, 500);
        assert_eq!(
            config.cache.redis.connection_url(),
            "redis://cache.internal:6380/2"
        );
    }

    #[test]
    fn test_redis_url_overrides_host() {
        let config = Config::parse(
            r#"
[cache.redis]
url = "redis://:secret@10.0.0.5:6379/1"
"#,
        )
        .unwrap();
        assert_eq!(
            config.cache.redis.connection_url(),
            "redis://:secret@10.0.0.5:6379/1"
        );
    }

    #[test]
    fn test_unknown_store_rejected() {
        let err = Config::parse("[cache]\nstore = \"sqlite\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("sqlite"));
    }

    #[test]
    fn test_unknown_key_generator_rejected() {
        assert!(Config::parse("[cache]\nkey_generator = \"sha1\"\n").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::parse("[cache.filesystem]\ncache_dir = \"\"\n").is_err());
        assert!(Config::parse("[cache.redis]\nhost = \" \"\n").is_err());
        assert!(Config::parse("[cache.redis]\ndb = -1\n").is_err());
        assert!(Config::parse("[logging]\nlevel = \"loud\"\n").is_err());
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        fs::write(&config_path, "[cache]\nstore = \"redis\"\n").unwrap();
        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            assert_eq!(config.unwrap().cache.store, StoreKind::Redis);
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(Path::new("nonexistent.toml"), || {
            let config = Config::load();
            assert!(config.is_err());
            assert!(config
                .unwrap_err()
                .to_string()
                .contains("nonexistent.toml"));
        });
    }

    #[test]
    fn test_load_or_default_without_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        with_config_env(&temp_dir.path().join("missing.toml"), || {
            let config = Config::load_or_default().unwrap();
            assert_eq!(config.cache.store, StoreKind::Filesystem);
        });
    }
}
