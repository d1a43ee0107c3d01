//! Collaborator interfaces for vector search, web search, and synthesis.

use crate::passage::{ScoredChunk, WebSearchResult};
use async_trait::async_trait;

/// Errors returned by external collaborators.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Collaborator is not configured or reachable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// Collaborator rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Collaborator failed while serving the request.
    #[error("request failed: {0}")]
    Failed(String),
    /// Collaborator returned something the adapter cannot use.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Vector index lookup.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return up to `top_k` chunks ordered by descending similarity.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, ProviderError>;
}

/// Web search lookup.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Return up to `max_results` results in provider rank order.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<WebSearchResult>, ProviderError>;
}

/// Single blocking completion call against a language model.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Complete the prompt and return the model's answer.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
