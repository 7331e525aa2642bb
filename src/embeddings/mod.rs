pub mod cached;
pub mod provider;

pub use cached::{CacheStats, CachedProvider};
pub use provider::{EmbeddingProvider, FnProvider};
