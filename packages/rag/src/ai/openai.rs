//! OpenAI implementation of the provider traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use rag::ai::OpenAIProvider;
//!
//! let provider = OpenAIProvider::new("sk-...").with_chat_model("gpt-4o");
//! let rag = RagOrchestrator::new(store, provider.clone(), provider);
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::Settings;
use crate::error::{ProviderError, ProviderResult};
use crate::traits::ai::{EmbeddingClient, GenerationClient};
use crate::types::conversation::ConversationTurn;

/// OpenAI-backed embedding and chat provider.
///
/// Defaults to text-embedding-ada-002 and gpt-4o-mini.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: OpenAIClient,
    embed_model: String,
    chat_model: String,
    temperature: Option<f32>,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_client(OpenAIClient::new(api_key))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: OpenAIClient) -> Self {
        Self {
            client,
            embed_model: "text-embedding-ada-002".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            temperature: None,
        }
    }

    /// Build from loaded settings (key, base URL, models, chat timeout).
    pub fn from_settings(settings: &Settings) -> Self {
        let mut client = OpenAIClient::new(settings.openai_api_key.expose_secret())
            .with_timeout(settings.rag.chat_timeout);
        if let Some(base_url) = &settings.openai_base_url {
            client = client.with_base_url(base_url.clone());
        }

        Self::from_client(client)
            .with_embed_model(settings.embed_model.clone())
            .with_chat_model(settings.chat_model.clone())
    }

    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("base_url", &self.client.base_url())
            .field("embed_model", &self.embed_model)
            .field("chat_model", &self.chat_model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmbeddingClient for OpenAIProvider {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.client
            .create_embedding(text, &self.embed_model)
            .await
            .map_err(provider_error)
    }
}

#[async_trait]
impl GenerationClient for OpenAIProvider {
    async fn complete(&self, messages: &[ConversationTurn]) -> ProviderResult<String> {
        let mut request =
            ChatRequest::new(&self.chat_model).with_messages(messages.iter().map(to_message));
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self.client.chat_completion(request).await.map_err(provider_error)?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %self.chat_model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        Ok(response.content)
    }
}

fn to_message(turn: &ConversationTurn) -> Message {
    Message::new(turn.role.as_str(), turn.content.clone())
}

fn provider_error(error: OpenAIError) -> ProviderError {
    match error {
        OpenAIError::Timeout => ProviderError::Timeout,
        OpenAIError::RateLimited(msg) => ProviderError::RateLimited(msg),
        OpenAIError::Parse(msg) => ProviderError::MalformedResponse(msg),
        OpenAIError::Api(msg) | OpenAIError::Network(msg) | OpenAIError::Config(msg) => {
            ProviderError::Unavailable(msg)
        }
    }
}
