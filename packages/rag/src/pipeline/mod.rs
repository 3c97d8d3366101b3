//! Retrieval-and-generation pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Query expansion and entity filters (FilterExtractor)
//! - Embedding with zero-vector fallback (QueryProcessor)
//! - Filtered vector search (retrieve)
//! - Citation aggregation and confidence
//! - Optional reranking
//! - Bounded context assembly and prompt composition
//! - Generation

pub mod aggregator;
pub mod context;
pub mod filter_extractor;
pub mod orchestrator;
pub mod prompts;
pub mod query_processor;
pub mod rerank;
pub mod retrieve;

pub use aggregator::{confidence, document_file_name, ResultAggregator};
pub use context::ContextBuilder;
pub use filter_extractor::{ExtractedQuery, FilterExtractor};
pub use orchestrator::{RagOrchestrator, EMPTY_QUERY_ERROR, SEARCH_UNAVAILABLE_ANSWER};
pub use prompts::{
    PromptComposer, CLINICAL_INSTRUCTIONS, DEFAULT_SCRIBE_TEMPLATE, NO_CONTEXT, SCRIBE_PREAMBLE,
};
pub use query_processor::{ProcessedQuery, QueryProcessor};
pub use rerank::KeywordOverlapReranker;
pub use retrieve::{retrieve, SearchOutcome};
