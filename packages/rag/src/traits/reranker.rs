//! Optional second-pass ordering of search hits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::hit::RetrievedHit;

/// Reorders hits by a secondary relevance signal.
///
/// Only invoked when more than one hit was retrieved. A failing reranker
/// leaves the original order in place.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(&self, query: &str, hits: Vec<RetrievedHit>) -> Result<Vec<RetrievedHit>>;
}
