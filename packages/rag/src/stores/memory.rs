//! In-memory vector store for testing and development.

use async_trait::async_trait;
use qdrant_client::Payload;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::filter::{matches_payload, to_native_filter};
use super::point::point_id;
use crate::error::{RagError, Result};
use crate::traits::store::{similarity, validate_chunks, CollectionSchema, Distance, VectorStore};
use crate::types::{chunk::DocumentChunk, filter::FilterSet, hit::RetrievedHit};

struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

struct Collection {
    schema: CollectionSchema,
    points: HashMap<String, StoredPoint>,
}

/// In-memory storage for one collection.
///
/// Evaluates the same filter predicate the Qdrant store sends over the wire.
/// Data is lost on drop.
pub struct MemoryStore {
    name: String,
    collection: RwLock<Option<Collection>>,
    schema: RwLock<Option<CollectionSchema>>,
    batch_size: usize,
    upsert_lock: Mutex<()>,
    searches: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("medical_documents")
    }
}

fn poisoned<T>(_: PoisonError<T>) -> RagError {
    RagError::store("memory store lock poisoned")
}

impl MemoryStore {
    /// Create a store for `name`. The collection does not exist until
    /// [`VectorStore::ensure_collection`] is called.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: RwLock::new(None),
            schema: RwLock::new(None),
            batch_size: 100,
            upsert_lock: Mutex::new(()),
            searches: AtomicUsize::new(0),
        }
    }

    /// Set the number of points written per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Number of searches served so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::Relaxed)
    }

    fn known_schema(&self) -> Result<Option<CollectionSchema>> {
        Ok(*self.schema.read().map_err(poisoned)?)
    }

    fn missing(&self) -> RagError {
        RagError::store(format!("collection not found: {}", self.name))
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    fn collection(&self) -> &str {
        &self.name
    }

    async fn ensure_collection(&self, vector_size: usize, distance: Distance) -> Result<bool> {
        let mut collection = self.collection.write().map_err(poisoned)?;
        if collection.is_some() {
            debug!(collection = %self.name, "Collection already exists");
            return Ok(false);
        }

        let schema = CollectionSchema::new(vector_size, distance);
        *collection = Some(Collection {
            schema,
            points: HashMap::new(),
        });
        *self.schema.write().map_err(poisoned)? = Some(schema);

        info!(collection = %self.name, vector_size, "Created in-memory collection");
        Ok(true)
    }

    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        let _serialized = self.upsert_lock.lock().await;

        let schema = {
            let collection = self.collection.read().map_err(poisoned)?;
            collection.as_ref().map(|c| c.schema).ok_or_else(|| self.missing())?
        };
        validate_chunks(chunks, Some(schema.vector_size))?;

        for batch in chunks.chunks(self.batch_size) {
            let mut guard = self.collection.write().map_err(poisoned)?;
            let collection = guard.as_mut().ok_or_else(|| self.missing())?;

            for chunk in batch {
                // validate_chunks guarantees the embedding is present
                let Some(vector) = chunk.embedding.clone() else {
                    continue;
                };
                collection.points.insert(
                    point_id(&chunk.id).to_string(),
                    StoredPoint {
                        vector,
                        payload: chunk.payload(),
                    },
                );
            }

            debug!(collection = %self.name, points = batch.len(), "Upserted batch");
        }

        Ok(chunks.len())
    }

    async fn search(
        &self,
        vector: &[f32],
        filters: &FilterSet,
        top_k: usize,
    ) -> Result<Vec<RetrievedHit>> {
        self.searches.fetch_add(1, Ordering::Relaxed);

        let predicate = to_native_filter(filters);
        let guard = self.collection.read().map_err(poisoned)?;
        let collection = guard.as_ref().ok_or_else(|| self.missing())?;

        let mut scored: Vec<(&String, f32, &StoredPoint)> = collection
            .points
            .iter()
            .filter(|(_, point)| {
                predicate
                    .as_ref()
                    .map_or(true, |f| matches_payload(f, &point.payload))
            })
            .map(|(id, point)| {
                (id, similarity(collection.schema.distance, vector, &point.vector), point)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(id, score, point)| RetrievedHit::from_payload(id.clone(), score, point.payload.clone()))
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        let guard = self.collection.read().map_err(poisoned)?;
        let collection = guard.as_ref().ok_or_else(|| self.missing())?;
        Ok(collection.points.len() as u64)
    }

    async fn delete_collection(&self) -> Result<bool> {
        let existed = self.collection.write().map_err(poisoned)?.take().is_some();
        if existed {
            info!(collection = %self.name, "Deleted in-memory collection");
        }
        Ok(existed)
    }

    async fn wipe_collection(&self) -> Result<()> {
        let schema = self
            .known_schema()?
            .ok_or_else(|| RagError::Config(format!("no schema known for {}", self.name)))?;

        self.delete_collection().await?;
        self.ensure_collection(schema.vector_size, schema.distance).await?;
        Ok(())
    }
}
