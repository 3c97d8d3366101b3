//! Query → (vector, filter set).
//!
//! Embedding failures never propagate from here: the processor substitutes a
//! zero vector of the configured dimension and replaces the filter set with a
//! bare fallback marker, so the search runs unfiltered.

use std::time::Duration;
use tracing::{debug, warn};

use super::filter_extractor::FilterExtractor;
use crate::error::{ProviderError, ProviderResult};
use crate::traits::ai::EmbeddingClient;
use crate::types::filter::FilterSet;

/// Output of [`QueryProcessor::process`].
#[derive(Debug, Clone)]
pub struct ProcessedQuery {
    /// Query embedding, or zeros on fallback
    pub vector: Vec<f32>,

    /// Entity filters plus query metadata
    pub filters: FilterSet,

    /// Text that was sent to the embedder
    pub expanded_query: String,

    /// Why the fallback vector was used
    pub fallback_reason: Option<ProviderError>,
}

impl ProcessedQuery {
    pub fn is_fallback(&self) -> bool {
        self.filters.metadata.is_fallback
    }
}

/// Composes entity extraction with a bounded embedding call.
pub struct QueryProcessor {
    extractor: FilterExtractor,
    embedding_dim: usize,
    entity_filter_key: String,
    embed_timeout: Duration,
}

impl QueryProcessor {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            extractor: FilterExtractor::medical(),
            embedding_dim,
            entity_filter_key: "medical_entities".to_string(),
            embed_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_extractor(mut self, extractor: FilterExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_entity_filter_key(mut self, key: impl Into<String>) -> Self {
        self.entity_filter_key = key.into();
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Expand and tag the query, then embed the expanded text.
    pub async fn process<E>(&self, embedder: &E, query: &str) -> ProcessedQuery
    where
        E: EmbeddingClient + ?Sized,
    {
        let extracted = self.extractor.extract(query);

        let mut filters = FilterSet::new();
        if let Some(entities) = extracted.to_filter_value() {
            filters.insert(self.entity_filter_key.clone(), entities);
        }

        debug!(
            query_id = %filters.metadata.query_id,
            entities = ?extracted.entities,
            "Extracted query filters"
        );

        match self.embed(embedder, &extracted.expanded_query).await {
            Ok(vector) => ProcessedQuery {
                vector,
                filters,
                expanded_query: extracted.expanded_query,
                fallback_reason: None,
            },
            Err(e) => {
                warn!(
                    query_id = %filters.metadata.query_id,
                    error = %e,
                    "Embedding failed, using zero-vector fallback"
                );
                filters.mark_fallback();
                ProcessedQuery {
                    vector: vec![0.0; self.embedding_dim],
                    filters,
                    expanded_query: extracted.expanded_query,
                    fallback_reason: Some(e),
                }
            }
        }
    }

    async fn embed<E>(&self, embedder: &E, text: &str) -> ProviderResult<Vec<f32>>
    where
        E: EmbeddingClient + ?Sized,
    {
        let vector = tokio::time::timeout(self.embed_timeout, embedder.embed(text))
            .await
            .map_err(|_| ProviderError::Timeout)??;

        if vector.len() != self.embedding_dim {
            return Err(ProviderError::DimensionMismatch {
                expected: self.embedding_dim,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEmbedder;
    use crate::types::filter::FilterValue;

    #[tokio::test]
    async fn test_successful_embedding() {
        let embedder = MockEmbedder::new(8);
        let processor = QueryProcessor::new(8);

        let processed = processor.process(&embedder, "aspirin dosing").await;

        assert_eq!(processed.vector.len(), 8);
        assert!(processed.vector.iter().any(|v| *v != 0.0));
        assert!(!processed.is_fallback());
        assert!(matches!(
            processed.filters.get("medical_entities"),
            Some(FilterValue::Category(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_zero_vector() {
        let embedder = MockEmbedder::new(8).failing_with(ProviderError::RateLimited("quota".into()));
        let processor = QueryProcessor::new(8);

        let processed = processor.process(&embedder, "stroke protocol").await;

        assert_eq!(processed.vector, vec![0.0; 8]);
        assert!(processed.is_fallback());
        assert!(processed.filters.filters.is_empty());
        assert_eq!(
            processed.fallback_reason,
            Some(ProviderError::RateLimited("quota".into()))
        );
    }

    #[tokio::test]
    async fn test_wrong_dimension_falls_back() {
        let embedder = MockEmbedder::new(4);
        let processor = QueryProcessor::new(8);

        let processed = processor.process(&embedder, "asthma").await;

        assert_eq!(processed.vector.len(), 8);
        assert!(processed.is_fallback());
        assert!(matches!(
            processed.fallback_reason,
            Some(ProviderError::DimensionMismatch { expected: 8, actual: 4 })
        ));
    }

    #[tokio::test]
    async fn test_slow_embedder_times_out() {
        let embedder = MockEmbedder::new(8).with_delay(Duration::from_millis(200));
        let processor = QueryProcessor::new(8).with_embed_timeout(Duration::from_millis(20));

        let processed = processor.process(&embedder, "sepsis").await;

        assert!(processed.is_fallback());
        assert_eq!(processed.fallback_reason, Some(ProviderError::Timeout));
    }

    #[tokio::test]
    async fn test_no_entities_means_no_filters() {
        let embedder = MockEmbedder::new(8);
        let processor = QueryProcessor::new(8);

        let processed = processor.process(&embedder, "visiting hours").await;
        assert!(processed.filters.is_empty());
        assert_eq!(embedder.calls().len(), 1);
    }
}
