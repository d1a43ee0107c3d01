//! Shared types for ragloop queries, retrieval collaborators, and lifecycle events.

mod passage;
mod provider;

pub use passage::{PassageOrigin, RetrievedPassage, ScoredChunk, WebSearchResult};
pub use provider::{ProviderError, Synthesizer, VectorSearch, WebSearch};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a single query invocation.
pub type QueryId = Uuid;

/// How a query sources its context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Retrieve local passages, filter them, and optionally blend in web results.
    #[default]
    Rag,
    /// Skip local retrieval; answer from history and optional web results only.
    Direct,
}

impl QueryMode {
    /// Return the mode as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Rag => "rag",
            QueryMode::Direct => "direct",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States of the per-query state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    /// Query accepted, nothing started yet.
    Idle,
    /// Waiting on the vector index or the web search provider.
    Retrieving,
    /// Applying the similarity threshold.
    Filtering,
    /// Terminal: nothing relevant to answer from.
    EmptyResult,
    /// Building the prompt payload.
    Composing,
    /// Waiting on the language model.
    Synthesizing,
    /// Terminal: answer produced and history updated.
    Done,
    /// Terminal: a collaborator failed.
    Failed,
}

impl QueryStage {
    /// Return the stage as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStage::Idle => "idle",
            QueryStage::Retrieving => "retrieving",
            QueryStage::Filtering => "filtering",
            QueryStage::EmptyResult => "empty_result",
            QueryStage::Composing => "composing",
            QueryStage::Synthesizing => "synthesizing",
            QueryStage::Done => "done",
            QueryStage::Failed => "failed",
        }
    }

    /// Whether the state machine stops in this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryStage::EmptyResult | QueryStage::Done | QueryStage::Failed
        )
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrapper for events emitted while a query runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMsg {
    /// Unique id for the event.
    pub id: Uuid,
    /// Query the event belongs to.
    pub query_id: QueryId,
    /// Timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// Event payload content.
    pub payload: EventPayload,
}

impl EventMsg {
    /// Stamp a payload with a fresh id and the current time.
    pub fn new(query_id: QueryId, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            query_id,
            created_at: Utc::now(),
            payload,
        }
    }
}

/// All events emitted during a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum EventPayload {
    /// Query accepted by the orchestrator.
    QueryStarted { mode: QueryMode, question_len: usize },
    /// State machine moved to a new stage.
    StageChanged { from: QueryStage, to: QueryStage },
    /// Threshold filter applied to local passages.
    PassagesFiltered {
        retrieved: usize,
        kept: usize,
        threshold: f32,
    },
    /// Prompt payload assembled.
    ContextComposed {
        prompt_chars: usize,
        dropped_web: usize,
        dropped_local: usize,
        dropped_history_pairs: usize,
    },
    /// Query finished with an answer or the canned empty-context reply.
    QueryCompleted {
        answered: bool,
        source_count: usize,
        web_source_count: usize,
        elapsed_ms: u64,
    },
    /// Query stopped in the failed state.
    QueryFailed { stage: QueryStage, message: String },
}

/// Sink interface for query lifecycle events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: EventMsg);
}
