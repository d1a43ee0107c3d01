//! Error types for the core query loop.

use ragloop_memory::MemoryError;
use ragloop_protocol::{ProviderError, QueryStage};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by query orchestration.
///
/// Every collaborator failure is translated into one of these variants at the
/// orchestrator boundary. An empty retrieval is not an error; it completes with
/// [`crate::QueryOutcome::NoRelevantContent`].
#[derive(Debug, Error)]
pub enum QueryError {
    /// Agent settings or per-query overrides are invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Vector index lookup failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] ProviderError),
    /// Web search lookup failed.
    #[error("web search failed: {0}")]
    WebSearch(#[source] ProviderError),
    /// Language model call failed.
    #[error("synthesis failed: {0}")]
    Synthesis(#[source] ProviderError),
    /// A stage exceeded its time limit.
    #[error("{stage} stage timed out after {after:?}")]
    Timeout { stage: QueryStage, after: Duration },
    /// The caller cancelled the query.
    #[error("query cancelled during {stage}")]
    Cancelled { stage: QueryStage },
    /// History window or transcript error.
    #[error("history error: {0}")]
    History(#[from] MemoryError),
}

impl QueryError {
    /// Stage of the query state machine the error belongs to.
    ///
    /// History errors come from window maintenance outside a running query and
    /// report [`QueryStage::Idle`].
    pub fn stage(&self) -> QueryStage {
        match self {
            QueryError::Configuration(_) | QueryError::History(_) => QueryStage::Idle,
            QueryError::Retrieval(_) | QueryError::WebSearch(_) => QueryStage::Retrieving,
            QueryError::Synthesis(_) => QueryStage::Synthesizing,
            QueryError::Timeout { stage, .. } | QueryError::Cancelled { stage } => *stage,
        }
    }
}
