//! Model provider traits.
//!
//! Embedding and generation are remote calls with their own latency and
//! failure characteristics. The pipeline only sees these two contracts.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::types::conversation::ConversationTurn;

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate an embedding for `text`.
    ///
    /// The pipeline checks the returned length against the configured
    /// dimension and treats a mismatch like any other provider failure.
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;
}

/// Turns a message list into an answer.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Complete the conversation, returning the assistant's reply.
    async fn complete(&self, messages: &[ConversationTurn]) -> ProviderResult<String>;
}
