//! Retrieval stage: store errors become an empty result plus a flag.

use tracing::{info, warn};

use crate::traits::store::VectorStore;
use crate::types::{filter::FilterSet, hit::RetrievedHit};

/// Hits from one search, with the store error if it failed.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub hits: Vec<RetrievedHit>,
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// Keep only hits scoring at least `threshold`. A threshold of 0 keeps all.
    pub fn apply_threshold(&mut self, threshold: f32) {
        if threshold > 0.0 {
            self.hits.retain(|hit| hit.score >= threshold);
        }
    }
}

/// Run a filtered search, never failing.
pub async fn retrieve<S>(store: &S, vector: &[f32], filters: &FilterSet, top_k: usize) -> SearchOutcome
where
    S: VectorStore + ?Sized,
{
    match store.search(vector, filters, top_k).await {
        Ok(hits) => {
            info!(
                query_id = %filters.metadata.query_id,
                collection = store.collection(),
                hits = hits.len(),
                "Retrieved documents"
            );
            SearchOutcome { hits, error: None }
        }
        Err(e) => {
            warn!(
                query_id = %filters.metadata.query_id,
                collection = store.collection(),
                error = %e,
                "Vector search failed"
            );
            SearchOutcome {
                hits: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::traits::store::Distance;
    use crate::types::chunk::DocumentChunk;

    #[tokio::test]
    async fn test_missing_collection_is_flagged_not_raised() {
        let store = MemoryStore::new("absent");
        let outcome = retrieve(&store, &[1.0, 0.0], &FilterSet::new(), 5).await;

        assert!(outcome.failed());
        assert!(outcome.hits.is_empty());
        assert!(outcome.error.unwrap().contains("absent"));
    }

    #[tokio::test]
    async fn test_threshold_drops_weak_hits() {
        let store = MemoryStore::new("docs");
        store.ensure_collection(2, Distance::Cosine).await.unwrap();
        store
            .upsert(&[
                DocumentChunk::new("a", "close").with_embedding(vec![1.0, 0.0]),
                DocumentChunk::new("b", "far").with_embedding(vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let mut outcome = retrieve(&store, &[1.0, 0.0], &FilterSet::new(), 5).await;
        assert_eq!(outcome.hits.len(), 2);

        outcome.apply_threshold(0.5);
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].content, "close");
    }
}
