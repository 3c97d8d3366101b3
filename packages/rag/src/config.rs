use dotenvy::dotenv;
use secrecy::SecretString;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RagError, Result};
use crate::types::config::RagConfig;

/// Deployment settings loaded from environment variables
#[derive(Debug)]
pub struct Settings {
    pub openai_api_key: SecretString,
    pub openai_base_url: Option<String>,
    pub embed_model: String,
    pub chat_model: String,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<SecretString>,
    pub rag: RagConfig,
}

impl Settings {
    /// Load settings from the environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| RagError::Config(format!("{} must be set", key)));

        let defaults = RagConfig::default();
        let rag = RagConfig {
            collection_name: var("QDRANT_COLLECTION_NAME").unwrap_or(defaults.collection_name.clone()),
            embedding_dim: parse_or(&var, "EMBEDDING_DIM", defaults.embedding_dim)?,
            top_k: parse_or(&var, "SEARCH_LIMIT", defaults.top_k)?,
            max_context_length: parse_or(&var, "MAX_CONTEXT_LENGTH", defaults.max_context_length)?,
            similarity_threshold: parse_or(&var, "SIMILARITY_THRESHOLD", defaults.similarity_threshold)?,
            use_reranker: parse_or(&var, "USE_RERANKER", defaults.use_reranker)?,
            include_sources: parse_or(&var, "INCLUDE_SOURCES", defaults.include_sources)?,
            search_failure_policy: parse_or(&var, "SEARCH_FAILURE_POLICY", defaults.search_failure_policy)?,
            document_base_url: var("DOCUMENT_BASE_URL").unwrap_or(defaults.document_base_url.clone()),
            embed_timeout: Duration::from_secs(parse_or(
                &var,
                "EMBED_TIMEOUT_SECS",
                defaults.embed_timeout.as_secs(),
            )?),
            chat_timeout: Duration::from_secs(parse_or(
                &var,
                "CHAT_TIMEOUT_SECS",
                defaults.chat_timeout.as_secs(),
            )?),
            ..defaults
        };

        if rag.embedding_dim == 0 {
            return Err(RagError::Config("EMBEDDING_DIM must be positive".into()));
        }

        Ok(Self {
            openai_api_key: SecretString::from(required("OPENAI_API_KEY")?),
            openai_base_url: var("OPENAI_BASE_URL"),
            embed_model: var("EMBED_MODEL").unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            chat_model: var("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            qdrant_url: required("QDRANT_URL")?,
            qdrant_api_key: var("QDRANT_API_KEY").map(SecretString::from),
            rag,
        })
    }
}

fn parse_or<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("{} must be a valid {}", key, std::any::type_name::<T>()))),
        None => Ok(default),
    }
}
