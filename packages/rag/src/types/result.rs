//! The value handed back to callers for every query.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::citation::Citation;

/// Pipeline states, in visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Embedding,
    Retrieving,
    Aggregating,
    Reranking,
    ContextBuilding,
    Generating,
    Done,
    Failed,
}

impl PipelineStage {
    /// Whether the pipeline stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

/// Answer, sources and diagnostics for one query.
///
/// A result with `error` set has an empty or placeholder `answer`, and
/// `citations` holds whatever was gathered before the failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub answer: String,
    pub citations: Vec<Citation>,

    /// Mean score of the top hits, in [0, 1]
    pub confidence: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock time spent on the query
    pub elapsed_ms: u64,

    /// Terminal stage (`done` or `failed`)
    pub stage: PipelineStage,

    /// Stages visited, in order
    pub trace: Vec<PipelineStage>,

    pub query_id: Uuid,

    /// Non-fatal degradations (embedding fallback, search failure, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PipelineResult {
    /// True when the pipeline produced an answer without a terminal error.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.stage == PipelineStage::Done
    }
}
