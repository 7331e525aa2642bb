pub mod cache_embeddings;

pub use cache_embeddings::CacheEmbeddings;
