//! Error types for the Qdrant client.

use thiserror::Error;

/// Result type for Qdrant client operations.
pub type Result<T> = std::result::Result<T, QdrantError>;

/// Qdrant client errors.
#[derive(Debug, Error)]
pub enum QdrantError {
    /// Configuration error (missing URL, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection refused, DNS, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Collection does not exist
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Non-2xx response from the server
    #[error("Qdrant API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response shape)
    #[error("Parse error: {0}")]
    Parse(String),
}
