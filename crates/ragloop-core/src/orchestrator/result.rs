//! Query inputs and results returned to callers.

use crate::composer::TruncationReport;
use ragloop_protocol::{QueryId, QueryMode, RetrievedPassage};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Answer returned when no passage clears the similarity threshold.
pub const NO_RELEVANT_CONTENT_MESSAGE: &str =
    "I could not find any relevant content to answer this question.";

/// Per-query overrides of the agent settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryOverrides {
    /// Number of passages requested from the vector index.
    pub top_k: Option<usize>,
    /// Minimum similarity for local passages.
    pub similarity_threshold: Option<f32>,
    /// Blend in web search results.
    pub enable_web_search: Option<bool>,
}

impl QueryOverrides {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.enable_web_search = Some(enabled);
        self
    }
}

/// How a completed query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The language model produced the answer.
    Answered,
    /// Nothing relevant was retrieved; the answer is [`NO_RELEVANT_CONTENT_MESSAGE`].
    NoRelevantContent,
}

/// Metadata describing how an answer was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub query_id: QueryId,
    /// Wall-clock time from start to finish.
    pub elapsed: Duration,
    /// Passages placed in the prompt (local and web).
    pub source_count: usize,
    /// Web passages placed in the prompt.
    pub web_source_count: usize,
    pub outcome: QueryOutcome,
    pub mode: QueryMode,
    /// What the composer dropped to fit the prompt budget.
    pub truncation: TruncationReport,
}

/// Answer plus the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    /// Local passages by descending relevance, followed by web passages in provider order.
    pub passages: Vec<RetrievedPassage>,
    pub metadata: QueryMetadata,
}

impl QueryResult {
    /// Whether the answer came from the language model.
    pub fn is_answered(&self) -> bool {
        self.metadata.outcome == QueryOutcome::Answered
    }
}
