//! Document chunks and the payload layout they are stored under.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key holding chunk text.
pub const CONTENT_KEY: &str = "content";

/// Alternate text key accepted when reading hits.
pub const TEXT_KEY: &str = "text";

/// Payload key holding the source document title.
pub const TITLE_KEY: &str = "document_title";

/// Payload key holding the page number.
pub const PAGE_KEY: &str = "page_number";

/// Payload key holding the section heading.
pub const HEADING_KEY: &str = "heading";

/// Payload key preserving the caller's chunk id.
pub const CHUNK_ID_KEY: &str = "chunk_id";

/// Title used when a payload names no document.
pub const UNKNOWN_DOCUMENT: &str = "Unknown Document";

/// A unit of indexed text.
///
/// Produced by ingestion and immutable once stored. `embedding` is optional
/// so that records arriving without one can be represented and rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,

    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DocumentChunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding: None,
            metadata: Map::new(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Convenience for the common title/page pair.
    pub fn with_source(self, title: impl Into<String>, page: i64) -> Self {
        self.with_metadata(TITLE_KEY, title.into())
            .with_metadata(PAGE_KEY, page)
    }

    /// Payload written to the store: metadata, then `content` and `chunk_id`.
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = self.metadata.clone();
        payload.insert(CONTENT_KEY.to_string(), Value::String(self.content.clone()));
        payload.insert(CHUNK_ID_KEY.to_string(), Value::String(self.id.clone()));
        payload
    }
}
