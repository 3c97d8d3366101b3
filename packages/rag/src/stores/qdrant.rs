//! Qdrant-backed vector store.

use async_trait::async_trait;
use qdrant_client::{
    CreateCollection, PointStruct, QdrantClient, QdrantError, SearchRequest, VectorParams,
};
use std::sync::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::filter::to_native_filter;
use super::point::point_id;
use crate::error::{RagError, Result};
use crate::traits::store::{validate_chunks, CollectionSchema, Distance, VectorStore};
use crate::types::{chunk::DocumentChunk, filter::FilterSet, hit::RetrievedHit};

impl From<Distance> for qdrant_client::Distance {
    fn from(distance: Distance) -> Self {
        match distance {
            Distance::Cosine => qdrant_client::Distance::Cosine,
            Distance::Euclid => qdrant_client::Distance::Euclid,
            Distance::Dot => qdrant_client::Distance::Dot,
        }
    }
}

/// Schema to adopt for a collection that already exists.
///
/// The server's vector config wins over the requested one. A size mismatch
/// is a configuration error since every later upsert and search would fail.
fn existing_schema(
    collection: &str,
    actual: Option<&VectorParams>,
    requested: CollectionSchema,
) -> Result<CollectionSchema> {
    let Some(actual) = actual else {
        warn!(collection, "Collection has no single-vector config, assuming requested schema");
        return Ok(requested);
    };

    if actual.size != requested.vector_size as u64 {
        return Err(RagError::Config(format!(
            "collection {} stores {}-dimensional vectors, configured for {}",
            collection, actual.size, requested.vector_size
        )));
    }

    let distance = match actual.distance {
        qdrant_client::Distance::Cosine => Distance::Cosine,
        qdrant_client::Distance::Euclid => Distance::Euclid,
        qdrant_client::Distance::Dot => Distance::Dot,
        qdrant_client::Distance::Manhattan => {
            return Err(RagError::Config(format!(
                "collection {} uses Manhattan distance, which is not supported",
                collection
            )))
        }
    };
    if distance != requested.distance {
        warn!(
            collection,
            requested = ?requested.distance,
            actual = ?distance,
            "Existing collection uses a different distance"
        );
    }

    Ok(CollectionSchema::new(requested.vector_size, distance))
}

/// Vector store over one Qdrant collection.
///
/// The client handle is cheap to clone; share the store itself behind an
/// `Arc` so that upserts stay serialized.
pub struct QdrantStore {
    client: QdrantClient,
    name: String,
    schema: RwLock<Option<CollectionSchema>>,
    indexing_threshold: Option<u64>,
    batch_size: usize,
    upsert_lock: Mutex<()>,
}

impl QdrantStore {
    pub fn new(client: QdrantClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
            schema: RwLock::new(None),
            indexing_threshold: None,
            batch_size: 100,
            upsert_lock: Mutex::new(()),
        }
    }

    /// Schema used for validation and by `wipe_collection` before
    /// `ensure_collection` has run.
    pub fn with_schema(self, schema: CollectionSchema) -> Self {
        if let Ok(mut current) = self.schema.write() {
            *current = Some(schema);
        }
        self
    }

    /// Optimizer indexing threshold applied when creating the collection.
    pub fn with_indexing_threshold(mut self, threshold: u64) -> Self {
        self.indexing_threshold = Some(threshold);
        self
    }

    /// Points per upsert request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn known_schema(&self) -> Result<Option<CollectionSchema>> {
        self.schema
            .read()
            .map(|s| *s)
            .map_err(|_| RagError::store("schema lock poisoned"))
    }

    fn remember(&self, schema: CollectionSchema) -> Result<()> {
        let mut current = self
            .schema
            .write()
            .map_err(|_| RagError::store("schema lock poisoned"))?;
        *current = Some(schema);
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn collection(&self) -> &str {
        &self.name
    }

    async fn ensure_collection(&self, vector_size: usize, distance: Distance) -> Result<bool> {
        if self.client.collection_exists(&self.name).await? {
            debug!(collection = %self.name, "Collection already exists");
            let info = self.client.get_collection(&self.name).await?;
            let schema = existing_schema(
                &self.name,
                info.vector_params(),
                CollectionSchema::new(vector_size, distance),
            )?;
            self.remember(schema)?;
            return Ok(false);
        }

        let mut definition = CreateCollection::new(vector_size as u64, distance.into());
        if let Some(threshold) = self.indexing_threshold {
            definition = definition.with_indexing_threshold(threshold);
        }

        self.client.create_collection(&self.name, &definition).await?;
        self.remember(CollectionSchema::new(vector_size, distance))?;

        info!(collection = %self.name, vector_size, "Created Qdrant collection");
        Ok(true)
    }

    async fn upsert(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        let expected = self.known_schema()?.map(|s| s.vector_size);
        validate_chunks(chunks, expected)?;

        let points: Vec<PointStruct> = chunks
            .iter()
            .filter_map(|chunk| {
                chunk.embedding.clone().map(|vector| PointStruct {
                    id: point_id(&chunk.id),
                    vector,
                    payload: chunk.payload(),
                })
            })
            .collect();

        let _serialized = self.upsert_lock.lock().await;

        for (index, batch) in points.chunks(self.batch_size).enumerate() {
            self.client.upsert_points(&self.name, batch, true).await?;
            debug!(
                collection = %self.name,
                batch = index + 1,
                points = batch.len(),
                "Upserted batch"
            );
        }

        info!(collection = %self.name, points = points.len(), "Upsert complete");
        Ok(points.len())
    }

    async fn search(
        &self,
        vector: &[f32],
        filters: &FilterSet,
        top_k: usize,
    ) -> Result<Vec<RetrievedHit>> {
        let request = SearchRequest::new(vector.to_vec(), top_k).with_filter(to_native_filter(filters));

        let hits = self.client.search_points(&self.name, &request).await?;

        Ok(hits
            .into_iter()
            .take(top_k)
            .map(|hit| {
                RetrievedHit::from_payload(hit.id.to_string(), hit.score, hit.payload.unwrap_or_default())
            })
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        let info = self.client.get_collection(&self.name).await?;
        Ok(info.points_count.or(info.vectors_count).unwrap_or(0))
    }

    async fn delete_collection(&self) -> Result<bool> {
        match self.client.delete_collection(&self.name).await {
            Ok(deleted) => {
                info!(collection = %self.name, deleted, "Deleted Qdrant collection");
                Ok(deleted)
            }
            Err(QdrantError::Api { status: 404, .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_mapping() {
        assert_eq!(
            qdrant_client::Distance::from(Distance::Cosine),
            qdrant_client::Distance::Cosine
        );
        assert_eq!(
            qdrant_client::Distance::from(Distance::Euclid),
            qdrant_client::Distance::Euclid
        );
    }

    #[test]
    fn test_existing_schema_follows_server_config() {
        let requested = CollectionSchema::new(1536, Distance::Cosine);

        let actual = VectorParams { size: 1536, distance: qdrant_client::Distance::Dot };
        let schema = existing_schema("docs", Some(&actual), requested).unwrap();
        assert_eq!(schema, CollectionSchema::new(1536, Distance::Dot));

        assert_eq!(existing_schema("docs", None, requested).unwrap(), requested);
    }

    #[test]
    fn test_existing_schema_rejects_dimension_mismatch() {
        let requested = CollectionSchema::new(1536, Distance::Cosine);

        let smaller = VectorParams { size: 768, distance: qdrant_client::Distance::Cosine };
        let err = existing_schema("docs", Some(&smaller), requested).unwrap_err();
        assert!(matches!(err, RagError::Config(ref m) if m.contains("768") && m.contains("1536")));

        let manhattan = VectorParams { size: 1536, distance: qdrant_client::Distance::Manhattan };
        assert!(matches!(
            existing_schema("docs", Some(&manhattan), requested),
            Err(RagError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_validates_before_any_request() {
        // Unroutable address: validation must fail before the client is used
        let store = QdrantStore::new(QdrantClient::new("http://127.0.0.1:1"), "docs")
            .with_schema(CollectionSchema::new(3, Distance::Cosine));

        let err = store
            .upsert(&[DocumentChunk::new("a", "x").with_embedding(vec![0.1, 0.2])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_wipe_without_schema_is_config_error() {
        let store = QdrantStore::new(QdrantClient::new("http://127.0.0.1:1"), "docs");
        assert!(matches!(
            store.wipe_collection().await,
            Err(RagError::Config(_))
        ));
    }
}
