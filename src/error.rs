use std::path::PathBuf;
use thiserror::Error;

/// Main error type for embedcache
#[derive(Error, Debug)]
pub enum CacheError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote key-value service errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Configuration or construction errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key cannot be used by the selected backend
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Stored bytes do not decode to an embedding
    #[error("Corrupt cache entry {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Cache directory exists but cannot be written
    #[error("Cache directory is not writable: {}", .0.display())]
    NotWritable(PathBuf),

    /// Failure reported by the wrapped embedding provider
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// Provider returned a different number of embeddings than requested
    #[error("Embedding provider returned {actual} embeddings for {expected} texts")]
    ProviderMismatch { expected: usize, actual: usize },
}

/// Convenient Result type using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Config("unknown store: disk".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("unknown store: disk"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CacheError = io_err.into();
        assert!(matches!(err, CacheError::Io(_)));
    }

    #[test]
    fn test_provider_mismatch_display() {
        let err = CacheError::ProviderMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Embedding provider returned 2 embeddings for 3 texts"
        );
    }

    #[test]
    fn test_not_writable_display() {
        let err = CacheError::NotWritable(PathBuf::from("/tmp/cache"));
        assert!(err.to_string().contains("/tmp/cache"));
    }
}
