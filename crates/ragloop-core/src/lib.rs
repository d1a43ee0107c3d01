//! Core query loop for ragloop.
//!
//! This crate owns agent settings, threshold filtering, prompt composition under
//! a budget, the query orchestrator state machine, and the LLM-backed
//! synthesizer adapter.

pub mod composer;
pub mod config;
pub mod error;
pub mod filter;
pub mod llm;
pub mod orchestrator;

pub use composer::{ComposedPrompt, ContextComposer, TruncationReport};
pub use config::{AgentConfig, DEFAULT_INSTRUCTIONS, capture_policy_from_settings};
pub use error::QueryError;
pub use filter::filter_by_threshold;
pub use llm::LlmSynthesizer;
/// Orchestrator and query result types.
pub use orchestrator::{
    CancelHandle, NO_RELEVANT_CONTENT_MESSAGE, QueryMetadata, QueryOrchestrator, QueryOutcome,
    QueryOverrides, QueryResult,
};
pub use ragloop_protocol::{EventSink, QueryMode, QueryStage};
