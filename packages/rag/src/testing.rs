//! Testing utilities including mock providers.
//!
//! These are useful for testing applications that use the RAG library
//! without making real embedding or chat calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::ai::{EmbeddingClient, GenerationClient};
use crate::types::conversation::{ConversationTurn, Role};

/// A mock embedding provider.
///
/// Produces deterministic sha256-seeded vectors unless a text has a
/// predefined embedding. Can be told to fail or stall.
#[derive(Clone)]
pub struct MockEmbedder {
    dim: usize,
    embeddings: Arc<RwLock<HashMap<String, Vec<f32>>>>,
    failure: Option<ProviderError>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockEmbedder {
    /// Create a mock producing `dim`-dimensional vectors.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            embeddings: Arc::default(),
            failure: None,
            delay: None,
            calls: Arc::default(),
        }
    }

    /// Return `embedding` whenever exactly `text` is embedded.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(text.into(), embedding);
        self
    }

    /// Fail every call with `error`.
    pub fn failing_with(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Texts embedded so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The vector this mock returns for `text` when no override exists.
    pub fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        (0..self.dim)
            .map(|i| {
                let byte = hash[i % 32] as f32;
                // Normalize to [-1, 1] range
                (byte / 127.5) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbedder {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let predefined = self
            .embeddings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(text)
            .cloned();

        Ok(predefined.unwrap_or_else(|| self.deterministic_embedding(text)))
    }
}

/// A mock chat provider.
///
/// Answers with a fixed response (or an echo of the last user message) and
/// records every message list it receives.
#[derive(Clone, Default)]
pub struct MockGenerator {
    response: Option<String>,
    failure: Option<ProviderError>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<Vec<ConversationTurn>>>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `response`.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Fail every call with `error`.
    pub fn failing_with(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Message lists received so far.
    pub fn calls(&self) -> Vec<Vec<ConversationTurn>> {
        self.calls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// System message of the most recent call.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.calls()
            .last()
            .and_then(|messages| messages.iter().find(|m| m.role == Role::System))
            .map(|m| m.content.clone())
    }
}

#[async_trait]
impl GenerationClient for MockGenerator {
    async fn complete(&self, messages: &[ConversationTurn]) -> ProviderResult<String> {
        self.calls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        if let Some(response) = &self.response {
            return Ok(response.clone());
        }

        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("Mock answer to: {}", question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(16);
        let a = embedder.embed("stroke").await.unwrap();
        let b = embedder.embed("stroke").await.unwrap();
        let c = embedder.embed("sepsis").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert_eq!(embedder.calls(), vec!["stroke", "stroke", "sepsis"]);
    }

    #[tokio::test]
    async fn test_predefined_embedding_wins() {
        let embedder = MockEmbedder::new(2).with_embedding("q", vec![1.0, 0.0]);
        assert_eq!(embedder.embed("q").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_generator_records_and_echoes() {
        let generator = MockGenerator::new();
        let answer = generator
            .complete(&[ConversationTurn::system("sys"), ConversationTurn::user("hi")])
            .await
            .unwrap();

        assert_eq!(answer, "Mock answer to: hi");
        assert_eq!(generator.calls().len(), 1);
        assert_eq!(generator.last_system_prompt().as_deref(), Some("sys"));
    }
}
