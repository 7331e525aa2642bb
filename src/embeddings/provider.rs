use crate::error::Result;
use crate::Embedding;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Bulk embedding computation.
///
/// Implementations return exactly one embedding per input text, in input
/// order. Timeouts, cancellation and retries are the implementation's concern.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}

#[async_trait]
impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<T> {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        (**self).embed_batch(texts).await
    }
}

/// Adapts an async function `Vec<String> -> Result<Vec<Embedding>>` into an
/// [`EmbeddingProvider`].
///
/// ```rust,no_run
/// use embedcache::embeddings::FnProvider;
/// use embedcache::{CacheError, Embedding};
///
/// let provider = FnProvider::new(|texts: Vec<String>| async move {
///     Ok::<Vec<Embedding>, CacheError>(texts.iter().map(|t| vec![t.len() as f32]).collect())
/// });
/// ```
pub struct FnProvider<F> {
    func: F,
}

impl<F> FnProvider<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> EmbeddingProvider for FnProvider<F>
where
    F: Fn(Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Embedding>>> + Send,
{
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        (self.func)(texts.to_vec()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[tokio::test]
    async fn test_fn_provider_preserves_order() {
        let provider = FnProvider::new(|texts: Vec<String>| async move {
            Ok::<Vec<Embedding>, CacheError>(texts.iter().map(|t| vec![t.len() as f32]).collect())
        });
        let texts = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];
        let result = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(result, vec![vec![1.0], vec![3.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn test_fn_provider_propagates_errors() {
        let provider = FnProvider::new(|_texts: Vec<String>| async move {
            Err::<Vec<Embedding>, _>(CacheError::Provider("model offline".to_string()))
        });
        let result = provider.embed_batch(&["x".to_string()]).await;
        assert!(matches!(result, Err(CacheError::Provider(_))));
    }

    #[tokio::test]
    async fn test_arc_provider() {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(FnProvider::new(
            |texts: Vec<String>| async move {
                Ok::<Vec<Embedding>, CacheError>(vec![vec![0.0]; texts.len()])
            },
        ));
        let result = provider.embed_batch(&["a".to_string()]).await.unwrap();
        assert_eq!(result.len(), 1);
    }
}
