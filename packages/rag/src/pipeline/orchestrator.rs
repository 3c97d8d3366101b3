//! The RagOrchestrator - main entry point for answering questions.
//!
//! Sequences the pipeline stages:
//!
//! ```text
//! Received → Embedding → Retrieving → Aggregating → (Reranking)
//!          → ContextBuilding → Generating → Done | Failed
//! ```
//!
//! Embedding failure degrades to a zero-vector search. Search failure is
//! recoverable and handled per [`SearchFailurePolicy`]. Only generation
//! failure, cancellation and an empty query end in `Failed`. Every path
//! returns a [`PipelineResult`].

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::aggregator::{confidence, ResultAggregator};
use super::context::ContextBuilder;
use super::prompts::PromptComposer;
use super::query_processor::QueryProcessor;
use super::rerank::KeywordOverlapReranker;
use super::retrieve::retrieve;
use crate::error::{RagError, Result};
use crate::traits::{
    ai::{EmbeddingClient, GenerationClient},
    reranker::Reranker,
    store::VectorStore,
};
use crate::types::{
    citation::Citation,
    config::{RagConfig, SearchFailurePolicy},
    conversation::{ConversationTurn, Mode},
    result::{PipelineResult, PipelineStage},
};

/// Answer returned when search failed and generation was skipped.
pub const SEARCH_UNAVAILABLE_ANSWER: &str =
    "_The document store could not be searched, so no answer was generated._";

/// Error reported for a blank query.
pub const EMPTY_QUERY_ERROR: &str = "query is empty";

/// Wires the pipeline components around a shared store and two providers.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(MemoryStore::new("medical_documents"));
/// let rag = RagOrchestrator::new(store, MockEmbedder::new(1536), MockGenerator::new());
///
/// let result = rag
///     .answer_query("What is the policy on heart attack triage?", &[], Mode::Chat, None)
///     .await?;
/// ```
pub struct RagOrchestrator<S: ?Sized, E, G> {
    store: Arc<S>,
    embedder: E,
    generator: G,
    reranker: Option<Box<dyn Reranker>>,
    processor: QueryProcessor,
    aggregator: ResultAggregator,
    context: ContextBuilder,
    prompts: PromptComposer,
    config: RagConfig,
}

impl<S, E, G> RagOrchestrator<S, E, G>
where
    S: VectorStore + ?Sized,
    E: EmbeddingClient,
    G: GenerationClient,
{
    /// Create an orchestrator with the default configuration.
    pub fn new(store: Arc<S>, embedder: E, generator: G) -> Self {
        Self::with_config(store, embedder, generator, RagConfig::default())
    }

    /// Create with custom configuration.
    ///
    /// Installs the keyword-overlap reranker when `config.use_reranker` is set.
    pub fn with_config(store: Arc<S>, embedder: E, generator: G, config: RagConfig) -> Self {
        let processor = QueryProcessor::new(config.embedding_dim)
            .with_entity_filter_key(config.entity_filter_key.clone())
            .with_embed_timeout(config.embed_timeout);

        let reranker: Option<Box<dyn Reranker>> = if config.use_reranker {
            Some(Box::new(KeywordOverlapReranker::default()))
        } else {
            None
        };

        Self {
            store,
            embedder,
            generator,
            reranker,
            processor,
            aggregator: ResultAggregator::new(config.max_citations, config.document_base_url.clone()),
            context: ContextBuilder::new(config.max_context_length),
            prompts: PromptComposer::default(),
            config,
        }
    }

    /// Install a reranker, replacing any configured one.
    pub fn with_reranker(mut self, reranker: impl Reranker + 'static) -> Self {
        self.reranker = Some(Box::new(reranker));
        self
    }

    /// Replace the query processor (custom vocabulary, filter key, timeout).
    pub fn with_query_processor(mut self, processor: QueryProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Replace the prompt composer.
    pub fn with_prompts(mut self, prompts: PromptComposer) -> Self {
        self.prompts = prompts;
        self
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The shared store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Answer a question.
    ///
    /// Upstream failures and an empty query are reported through
    /// [`PipelineResult::error`], so the returned result is always `Ok`.
    pub async fn answer_query(
        &self,
        query: &str,
        history: &[ConversationTurn],
        mode: Mode,
        template_name: Option<&str>,
    ) -> Result<PipelineResult> {
        self.answer_query_with_cancel(query, history, mode, template_name, CancellationToken::new())
            .await
    }

    /// Answer a question, abandoning the request when `cancel` fires.
    ///
    /// Cancellation is observed at each suspension point (embedding, search,
    /// generation). A cancelled request keeps the citations gathered so far.
    pub async fn answer_query_with_cancel(
        &self,
        query: &str,
        history: &[ConversationTurn],
        mode: Mode,
        template_name: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<PipelineResult> {
        if query.trim().is_empty() {
            let mut run = Run::start();
            run.query_id = Uuid::now_v7();
            return Ok(run.fail(EMPTY_QUERY_ERROR));
        }

        let span = info_span!("answer_query", %mode, query_id = field::Empty);
        let result = self
            .run(query, history, mode, template_name, &cancel)
            .instrument(span)
            .await;
        Ok(result)
    }

    async fn run(
        &self,
        query: &str,
        history: &[ConversationTurn],
        mode: Mode,
        template_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let mut run = Run::start();

        // Embedding
        run.enter(PipelineStage::Embedding);
        let Some(processed) = guarded(cancel, self.processor.process(&self.embedder, query)).await
        else {
            return run.fail(RagError::Cancelled.to_string());
        };

        run.query_id = processed.filters.metadata.query_id;
        Span::current().record("query_id", field::display(run.query_id));

        if let Some(reason) = &processed.fallback_reason {
            run.warn(format!(
                "zero-vector fallback used: {}",
                RagError::Embedding(reason.clone())
            ));
        }

        // Retrieving
        run.enter(PipelineStage::Retrieving);
        let Some(mut outcome) = guarded(
            cancel,
            retrieve(
                self.store.as_ref(),
                &processed.vector,
                &processed.filters,
                self.config.top_k,
            ),
        )
        .await
        else {
            return run.fail(RagError::Cancelled.to_string());
        };

        if let Some(error) = outcome.error.take() {
            match self.config.search_failure_policy {
                SearchFailurePolicy::Placeholder => {
                    return run.degraded(SEARCH_UNAVAILABLE_ANSWER, format!("search failed: {}", error));
                }
                SearchFailurePolicy::GenerateWithoutContext => {
                    run.warn(format!("search failed, answering without context: {}", error));
                }
            }
        }

        outcome.apply_threshold(self.config.similarity_threshold);
        let mut hits = outcome.hits;

        // Aggregating
        run.enter(PipelineStage::Aggregating);
        run.confidence = confidence(&hits);
        if self.config.include_sources {
            run.citations = self.aggregator.aggregate(&hits);
        }

        // Reranking
        if let Some(reranker) = self.reranker.as_ref().filter(|_| hits.len() > 1) {
            run.enter(PipelineStage::Reranking);
            match reranker.rerank(query, hits.clone()).await {
                Ok(reranked) => hits = reranked,
                Err(e) => run.warn(format!("rerank failed, keeping retrieval order: {}", e)),
            }
        }

        // ContextBuilding
        run.enter(PipelineStage::ContextBuilding);
        let context = self.context.build(&hits);
        debug!(
            hits = hits.len(),
            context_chars = context.chars().count(),
            "Built context"
        );

        // Generating
        run.enter(PipelineStage::Generating);
        let messages = self.prompts.compose(query, &context, history, mode, template_name);
        let generation = tokio::time::timeout(
            self.config.chat_timeout,
            self.generator.complete(&messages),
        );

        match guarded(cancel, generation).await {
            None => run.fail(RagError::Cancelled.to_string()),
            Some(Err(_)) => run.fail(RagError::Timeout { stage: "generation" }.to_string()),
            Some(Ok(Err(e))) => run.fail(RagError::Generation(e).to_string()),
            Some(Ok(Ok(answer))) => run.finish(answer),
        }
    }
}

/// Await `fut` unless `cancel` fires first.
async fn guarded<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

/// Per-request bookkeeping that becomes the [`PipelineResult`].
struct Run {
    started: Instant,
    query_id: Uuid,
    trace: Vec<PipelineStage>,
    warnings: Vec<String>,
    citations: Vec<Citation>,
    confidence: f32,
}

impl Run {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            query_id: Uuid::nil(),
            trace: vec![PipelineStage::Received],
            warnings: Vec::new(),
            citations: Vec::new(),
            confidence: 0.0,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        debug!(?stage, "Entering stage");
        self.trace.push(stage);
    }

    fn warn(&mut self, message: String) {
        warn!(warning = %message, "Pipeline degraded");
        self.warnings.push(message);
    }

    fn finish(self, answer: String) -> PipelineResult {
        self.complete(PipelineStage::Done, answer, None)
    }

    /// Recoverable failure: a placeholder answer plus the error, not `Failed`.
    fn degraded(self, placeholder: &str, error: String) -> PipelineResult {
        self.complete(PipelineStage::Done, placeholder.to_string(), Some(error))
    }

    fn fail(self, error: impl Into<String>) -> PipelineResult {
        self.complete(PipelineStage::Failed, String::new(), Some(error.into()))
    }

    fn complete(mut self, stage: PipelineStage, answer: String, error: Option<String>) -> PipelineResult {
        self.trace.push(stage);
        let elapsed_ms = self.started.elapsed().as_millis() as u64;

        match &error {
            Some(e) => warn!(?stage, error = %e, elapsed_ms, "Query finished with error"),
            None => info!(
                citations = self.citations.len(),
                confidence = self.confidence,
                elapsed_ms,
                "Query answered"
            ),
        }

        PipelineResult {
            answer,
            citations: self.citations,
            confidence: self.confidence,
            error,
            elapsed_ms,
            stage,
            trace: self.trace,
            query_id: self.query_id,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{MockEmbedder, MockGenerator};

    fn orchestrator() -> RagOrchestrator<MemoryStore, MockEmbedder, MockGenerator> {
        RagOrchestrator::with_config(
            Arc::new(MemoryStore::new("docs")),
            MockEmbedder::new(8),
            MockGenerator::new(),
            RagConfig::default().with_embedding_dim(8),
        )
    }

    #[tokio::test]
    async fn test_empty_query_fails_before_io() {
        let rag = orchestrator();
        let result = rag.answer_query("  ", &[], Mode::Chat, None).await.unwrap();

        assert_eq!(result.stage, PipelineStage::Failed);
        assert_eq!(result.error.as_deref(), Some(EMPTY_QUERY_ERROR));
        assert!(result.answer.is_empty());
        assert_eq!(result.trace, vec![PipelineStage::Received, PipelineStage::Failed]);
        assert_eq!(rag.store().search_count(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_returns_placeholder() {
        // Collection never created, so the search fails
        let rag = orchestrator();
        let result = rag
            .answer_query("aspirin dose", &[], Mode::Chat, None)
            .await
            .unwrap();

        assert_eq!(result.answer, SEARCH_UNAVAILABLE_ANSWER);
        assert!(result.citations.is_empty());
        assert!(result.error.as_deref().unwrap().starts_with("search failed"));
        assert_eq!(result.stage, PipelineStage::Done);
        assert!(!result.trace.contains(&PipelineStage::Generating));
    }

    #[tokio::test]
    async fn test_trace_order() {
        let rag = orchestrator();
        rag.store()
            .ensure_collection(8, crate::traits::store::Distance::Cosine)
            .await
            .unwrap();

        let result = rag
            .answer_query("visiting hours", &[], Mode::Chat, None)
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(
            result.trace,
            vec![
                PipelineStage::Received,
                PipelineStage::Embedding,
                PipelineStage::Retrieving,
                PipelineStage::Aggregating,
                PipelineStage::ContextBuilding,
                PipelineStage::Generating,
                PipelineStage::Done,
            ]
        );
        assert_ne!(result.query_id, Uuid::nil());
    }
}
