//! Query embedding with a content-addressed cache in front of the provider.

use super::{validate_vectors, Embedder, TaskType};
use crate::cache::VectorCache;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds single query texts, consulting the cache first.
#[derive(Clone)]
pub struct QueryEmbedder {
    embedder: Arc<dyn Embedder>,
    cache: Arc<dyn VectorCache>,
}

impl QueryEmbedder {
    pub fn new(embedder: Arc<dyn Embedder>, cache: Arc<dyn VectorCache>) -> Self {
        Self { embedder, cache }
    }

    pub fn cache(&self) -> &Arc<dyn VectorCache> {
        &self.cache
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embed `text` as a query.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.cache.get(text, TaskType::Query) {
            debug!("Query embedding cache hit");
            return Ok(vector);
        }

        let inputs = [text.to_string()];
        let raw = self.embedder.embed_batch(&inputs, TaskType::Query).await?;
        let vector = validate_vectors(&inputs[..], raw)?
            .into_iter()
            .next()
            .unwrap_or_default();

        self.cache.set(text, TaskType::Query, vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EmbeddingCache;
    use crate::embedding::{BatchError, RawEmbeddings};
    use crate::error::VidlensError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
        response: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed_batch(&self, _texts: &[String], _task: TaskType) -> Result<RawEmbeddings> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawEmbeddings::Batch(self.response.clone()))
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    fn setup(response: Vec<Vec<f32>>) -> (Arc<CountingEmbedder>, QueryEmbedder) {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            response,
        });
        let cache = Arc::new(EmbeddingCache::new(8).unwrap());
        let query = QueryEmbedder::new(embedder.clone(), cache);
        (embedder, query)
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let (embedder, query) = setup(vec![vec![0.1, 0.2]]);

        assert_eq!(query.embed_query("what is rust").await.unwrap(), vec![0.1, 0.2]);
        assert_eq!(query.embed_query("what is rust").await.unwrap(), vec![0.1, 0.2]);

        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        let stats = query.cache().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_invalid_response_not_cached() {
        let (embedder, query) = setup(vec![vec![]]);

        let err = query.embed_query("q").await.unwrap_err();
        assert!(matches!(err, VidlensError::Batch(BatchError::EmptyVector { index: 0 })));
        assert_eq!(query.cache().stats().size, 0);

        let _ = query.embed_query("q").await;
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }
}
