//! Passage types exchanged between retrieval collaborators and the orchestrator.

use serde::{Deserialize, Serialize};

/// Where a passage came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PassageOrigin {
    /// Local vector index.
    Local,
    /// Web search provider.
    Web,
}

/// Raw hit returned by a vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// Chunk text.
    pub text: String,
    /// Document or node identifier within the index.
    pub source_id: String,
    /// Similarity score, comparable within one search call.
    pub score: f32,
}

/// Search result returned by a web provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebSearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Result snippet.
    pub snippet: String,
}

/// Strongly typed passage used for filtering and prompt composition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedPassage {
    /// Passage text placed into the prompt.
    pub text: String,
    /// Identifier of the originating document or URL.
    pub source_id: String,
    /// Similarity score for local passages; web passages carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
    /// Passage origin.
    pub origin: PassageOrigin,
}

impl RetrievedPassage {
    /// Build a local passage with a similarity score.
    pub fn local(text: impl Into<String>, source_id: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            similarity_score: Some(score),
            origin: PassageOrigin::Local,
        }
    }

    /// Build a web passage; web passages are never scored.
    pub fn web(text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            similarity_score: None,
            origin: PassageOrigin::Web,
        }
    }

    /// Whether the passage came from web search.
    pub fn is_web(&self) -> bool {
        self.origin == PassageOrigin::Web
    }
}

impl From<ScoredChunk> for RetrievedPassage {
    fn from(chunk: ScoredChunk) -> Self {
        RetrievedPassage::local(chunk.text, chunk.source_id, chunk.score)
    }
}

impl From<WebSearchResult> for RetrievedPassage {
    fn from(result: WebSearchResult) -> Self {
        let title = result.title.trim();
        let snippet = result.snippet.trim();
        let text = if title.is_empty() {
            snippet.to_string()
        } else if snippet.is_empty() {
            title.to_string()
        } else {
            format!("{title}\n{snippet}")
        };
        RetrievedPassage::web(text, result.url)
    }
}
