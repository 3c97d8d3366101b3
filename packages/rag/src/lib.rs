//! Retrieval-Augmented Question Answering
//!
//! Answers natural-language questions over a private document corpus stored
//! in a vector database, with page-level citations and a confidence score.
//!
//! # Design Philosophy
//!
//! - Degrade, don't fail: embedding and search outages still produce a result
//! - Citations are computed from what was retrieved, never from the answer
//! - Providers and stores sit behind traits so tests run fully in memory
//!
//! # Usage
//!
//! ```rust,ignore
//! use rag::{MemoryStore, Mode, RagOrchestrator};
//! use rag::testing::{MockEmbedder, MockGenerator};
//!
//! let store = Arc::new(MemoryStore::new("medical_documents"));
//! let rag = RagOrchestrator::new(store, MockEmbedder::new(1536), MockGenerator::new());
//!
//! let result = rag
//!     .answer_query("What is the protocol for a heart attack?", &[], Mode::Chat, None)
//!     .await?;
//! for citation in &result.citations {
//!     println!("{} (pages {})", citation.document_title, citation.pages);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Provider, store and reranker abstractions
//! - [`types`] - Filters, hits, citations, results and configuration
//! - [`pipeline`] - Query processing through generation
//! - [`stores`] - Vector store implementations (MemoryStore, QdrantStore)
//! - [`config`] - Environment-driven settings
//! - [`testing`] - Mock providers for testing

pub mod config;
pub mod error;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use config::Settings;
pub use error::{ProviderError, ProviderResult, RagError, Result};
pub use traits::{
    ai::{EmbeddingClient, GenerationClient},
    reranker::Reranker,
    store::{CollectionSchema, Distance, VectorStore},
};
pub use types::{
    chunk::DocumentChunk,
    citation::Citation,
    config::{RagConfig, SearchFailurePolicy},
    conversation::{ConversationTurn, Mode, Role},
    filter::{FilterMetadata, FilterScalar, FilterSet, FilterValue},
    hit::RetrievedHit,
    result::{PipelineResult, PipelineStage},
};

// Re-export pipeline components
pub use pipeline::{
    ContextBuilder, ExtractedQuery, FilterExtractor, KeywordOverlapReranker, ProcessedQuery,
    PromptComposer, QueryProcessor, RagOrchestrator, ResultAggregator,
};

// Re-export stores
pub use stores::{MemoryStore, QdrantStore};

#[cfg(feature = "openai")]
pub use ai::OpenAIProvider;
