//! Typed errors for the RAG library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Embedding provider failed
    #[error("embedding error: {0}")]
    Embedding(#[source] ProviderError),

    /// Generation provider failed
    #[error("generation error: {0}")]
    Generation(#[source] ProviderError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Input rejected before any I/O
    #[error("invalid input: {reason}")]
    Validation { reason: String },

    /// Missing or malformed configuration
    #[error("config error: {0}")]
    Config(String),

    /// Operation was cancelled
    #[error("request cancelled")]
    Cancelled,

    /// A pipeline stage exceeded its deadline
    #[error("{stage} timed out")]
    Timeout { stage: &'static str },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RagError {
    /// Shorthand for a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Wrap a store failure given only a message.
    pub fn store(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Store(message.into())
    }
}

impl From<qdrant_client::QdrantError> for RagError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Errors reported by embedding and generation providers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// Provider did not answer in time
    #[error("request timed out")]
    Timeout,

    /// Quota or rate limit exceeded
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Response could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Embedding length differs from the configured dimension
    #[error("expected {expected}-dimensional embedding, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Transport or server-side failure
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Result type alias for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
