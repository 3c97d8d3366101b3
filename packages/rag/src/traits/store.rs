//! Vector store trait and shared helpers.
//!
//! A store owns one named collection. It creates the collection on demand,
//! accepts batched upserts and answers filtered top-k similarity searches.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::types::{chunk::DocumentChunk, filter::FilterSet, hit::RetrievedHit};

/// Vector distance metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    Euclid,
    Dot,
}

/// Vector schema of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub vector_size: usize,
    pub distance: Distance,
}

impl CollectionSchema {
    pub fn new(vector_size: usize, distance: Distance) -> Self {
        Self {
            vector_size,
            distance,
        }
    }
}

/// Storage for embedded document chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the collection this store owns.
    fn collection(&self) -> &str;

    /// Create the collection if it does not exist.
    ///
    /// Never modifies an existing collection. Returns `true` when the
    /// collection was created by this call.
    async fn ensure_collection(&self, vector_size: usize, distance: Distance) -> Result<bool>;

    /// Insert or overwrite chunks, keyed by chunk id.
    ///
    /// Every chunk is validated before anything is written: a missing
    /// embedding or a wrong dimension rejects the whole call. Writes are
    /// batched and serialized per store. Returns the number of chunks written.
    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize>;

    /// Top-k hits by descending similarity, restricted by `filters`.
    async fn search(
        &self,
        vector: &[f32],
        filters: &FilterSet,
        top_k: usize,
    ) -> Result<Vec<RetrievedHit>>;

    /// Number of points in the collection.
    async fn count(&self) -> Result<u64>;

    /// Delete the collection. Returns `true` if it existed.
    async fn delete_collection(&self) -> Result<bool>;

    /// Delete and re-create the collection with its last known schema.
    async fn wipe_collection(&self) -> Result<()>;
}

/// Check every chunk before writing any of them.
///
/// With no known schema, all embeddings must at least agree with each other.
pub fn validate_chunks(chunks: &[DocumentChunk], expected_dim: Option<usize>) -> Result<()> {
    let mut expected = expected_dim;

    for chunk in chunks {
        if chunk.id.trim().is_empty() {
            return Err(RagError::validation("chunk has an empty id"));
        }

        let embedding = chunk.embedding.as_ref().ok_or_else(|| {
            RagError::validation(format!("chunk {} has no embedding", chunk.id))
        })?;

        match expected {
            Some(dim) if embedding.len() != dim => {
                return Err(RagError::validation(format!(
                    "chunk {} has a {}-dimensional embedding, expected {}",
                    chunk.id,
                    embedding.len(),
                    dim
                )));
            }
            Some(_) => {}
            None => expected = Some(embedding.len()),
        }
    }

    Ok(())
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Similarity under `distance`, higher is closer.
pub fn similarity(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_similarity(a, b),
        Distance::Dot => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        Distance::Euclid => {
            let d: f32 = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt();
            1.0 / (1.0 + d)
        }
    }
}
