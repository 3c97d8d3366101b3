//! Pure OpenAI REST API client
//!
//! A clean, minimal client for the two OpenAI endpoints a retrieval pipeline
//! needs: chat completions and embeddings. No domain-specific logic lives here.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//! use std::time::Duration;
//!
//! let client = OpenAIClient::from_env()?.with_timeout(Duration::from_secs(30));
//!
//! // Chat completion
//! let response = client.chat_completion(
//!     ChatRequest::new("gpt-4o-mini").push(Message::user("Hello!")),
//! ).await?;
//!
//! // Embeddings
//! let embedding = client.create_embedding("text to embed", "text-embedding-ada-002").await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: None,
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`. Expired requests fail with
    /// [`OpenAIError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self
            .http_client
            .post(format!("{}/{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    /// Send a chat completion and return the first choice.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .post("chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(model = %request.model, error = %e, "Chat request failed");
                OpenAIError::from_transport(&e)
            })?;

        let envelope: types::CompletionEnvelope = ensure_success(response, "chat completion")
            .await?
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let choice = envelope
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OpenAIError::Parse("completion has no choices".into()))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| OpenAIError::Parse("completion choice has no content".into()))?;

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion"
        );

        Ok(ChatResponse {
            content,
            finish_reason: choice.finish_reason,
            usage: envelope.usage,
        })
    }

    /// Embed one text with `model`.
    ///
    /// text-embedding-ada-002 and text-embedding-3-small both return 1536
    /// dimensions.
    pub async fn create_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let response = self
            .post("embeddings")
            .json(&types::EmbeddingRequest { model, input: text })
            .send()
            .await
            .map_err(|e| {
                warn!(model, error = %e, "Embedding request failed");
                OpenAIError::from_transport(&e)
            })?;

        let envelope: types::EmbeddingEnvelope = ensure_success(response, "embedding")
            .await?
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        match envelope.data.into_iter().next() {
            Some(item) if !item.embedding.is_empty() => Ok(item.embedding),
            Some(_) => Err(OpenAIError::Parse("embedding is empty".into())),
            None => Err(OpenAIError::Parse("response has no embedding".into())),
        }
    }
}

/// Turn a non-2xx response into a typed error, passing 2xx responses through.
async fn ensure_success(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    warn!(status = %status, error = %error_text, operation, "OpenAI API error");
    Err(OpenAIError::from_status(status, &error_text))
}

impl OpenAIError {
    /// Classify an HTTP status returned by the API.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => OpenAIError::RateLimited(body.to_string()),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => OpenAIError::Timeout,
            _ => OpenAIError::Api(format!("{}: {}", status, body)),
        }
    }

    fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            OpenAIError::Timeout
        } else {
            OpenAIError::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test")
            .with_base_url("https://custom.api.com/")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url, "https://custom.api.com");
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = OpenAIClient::new("sk-super-secret");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("sk-super-secret"));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            OpenAIError::from_status(StatusCode::TOO_MANY_REQUESTS, "quota"),
            OpenAIError::RateLimited(_)
        ));
        assert!(matches!(
            OpenAIError::from_status(StatusCode::GATEWAY_TIMEOUT, ""),
            OpenAIError::Timeout
        ));
        assert!(matches!(
            OpenAIError::from_status(StatusCode::BAD_REQUEST, "bad"),
            OpenAIError::Api(_)
        ));
    }
}
