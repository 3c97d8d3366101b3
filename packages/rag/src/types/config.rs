//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::traits::store::Distance;

/// What to do when the vector store search fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailurePolicy {
    /// Skip generation and return a marked placeholder answer with the error.
    #[default]
    Placeholder,

    /// Generate without context and record the failure as a warning.
    GenerateWithoutContext,
}

impl FromStr for SearchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "placeholder" => Ok(Self::Placeholder),
            "generate_without_context" => Ok(Self::GenerateWithoutContext),
            other => Err(format!("unknown search failure policy: {}", other)),
        }
    }
}

impl fmt::Display for SearchFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => f.write_str("placeholder"),
            Self::GenerateWithoutContext => f.write_str("generate_without_context"),
        }
    }
}

/// Configuration for the retrieval-and-generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Vector store collection name.
    ///
    /// Default: "medical_documents".
    pub collection_name: String,

    /// Embedding dimension, also the size of the fallback zero vector.
    ///
    /// Default: 1536.
    pub embedding_dim: usize,

    /// Distance metric used when creating the collection.
    pub distance: Distance,

    /// Optimizer indexing threshold applied at collection creation.
    pub indexing_threshold: u64,

    /// Points per upsert request.
    pub upsert_batch_size: usize,

    /// Hits requested from the store.
    ///
    /// Default: 5.
    pub top_k: usize,

    /// Character budget for the assembled context.
    ///
    /// Default: 3000.
    pub max_context_length: usize,

    /// Maximum citations returned with an answer.
    pub max_citations: usize,

    /// Return citations with the answer.
    pub include_sources: bool,

    /// Drop hits scoring below this before aggregation. 0 disables.
    pub similarity_threshold: f32,

    /// Rerank hits when a reranker is installed.
    pub use_reranker: bool,

    /// Payload key carrying extracted entity terms.
    pub entity_filter_key: String,

    /// Prefix for citation viewer links.
    pub document_base_url: String,

    /// Deadline for the embedding call.
    #[serde(with = "duration_secs")]
    pub embed_timeout: Duration,

    /// Deadline for the generation call.
    #[serde(with = "duration_secs")]
    pub chat_timeout: Duration,

    /// Behaviour when retrieval fails.
    pub search_failure_policy: SearchFailurePolicy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection_name: "medical_documents".to_string(),
            embedding_dim: 1536,
            distance: Distance::Cosine,
            indexing_threshold: 10_000,
            upsert_batch_size: 100,
            top_k: 5,
            max_context_length: 3000,
            max_citations: 5,
            include_sources: true,
            similarity_threshold: 0.0,
            use_reranker: false,
            entity_filter_key: "medical_entities".to_string(),
            document_base_url: "/predictive/api/documents/view".to_string(),
            embed_timeout: Duration::from_secs(10),
            chat_timeout: Duration::from_secs(60),
            search_failure_policy: SearchFailurePolicy::default(),
        }
    }
}

impl RagConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_context_length(mut self, length: usize) -> Self {
        self.max_context_length = length;
        self
    }

    pub fn with_max_citations(mut self, max: usize) -> Self {
        self.max_citations = max;
        self
    }

    pub fn with_include_sources(mut self, include: bool) -> Self {
        self.include_sources = include;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_reranker(mut self, enabled: bool) -> Self {
        self.use_reranker = enabled;
        self
    }

    pub fn with_document_base_url(mut self, url: impl Into<String>) -> Self {
        self.document_base_url = url.into();
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    pub fn with_search_failure_policy(mut self, policy: SearchFailurePolicy) -> Self {
        self.search_failure_policy = policy;
        self
    }
}

/// Durations are configured in whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.collection_name, "medical_documents");
        assert_eq!(config.embedding_dim, 1536);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.max_context_length, 3000);
        assert_eq!(config.max_citations, 5);
        assert_eq!(config.upsert_batch_size, 100);
        assert_eq!(config.search_failure_policy, SearchFailurePolicy::Placeholder);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: RagConfig =
            serde_json::from_str(r#"{"top_k": 8, "embed_timeout": 3}"#).unwrap();
        assert_eq!(config.top_k, 8);
        assert_eq!(config.embed_timeout, Duration::from_secs(3));
        assert_eq!(config.embedding_dim, 1536);
    }

    #[test]
    fn test_failure_policy_parses_env_spellings() {
        assert_eq!("placeholder".parse::<SearchFailurePolicy>(), Ok(SearchFailurePolicy::Placeholder));
        assert_eq!(
            " Generate-Without-Context ".parse::<SearchFailurePolicy>(),
            Ok(SearchFailurePolicy::GenerateWithoutContext)
        );
        assert!("retry".parse::<SearchFailurePolicy>().is_err());
        assert_eq!(SearchFailurePolicy::GenerateWithoutContext.to_string(), "generate_without_context");
    }
}
