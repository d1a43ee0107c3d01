use async_trait::async_trait;
use parking_lot::Mutex;
use ragloop_protocol::{ProviderError, ScoredChunk, VectorSearch, WebSearch, WebSearchResult};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn chunk(text: &str, source_id: &str, score: f32) -> ScoredChunk {
    ScoredChunk {
        text: text.to_string(),
        source_id: source_id.to_string(),
        score,
    }
}

pub fn web_result(title: &str, url: &str, snippet: &str) -> WebSearchResult {
    WebSearchResult {
        title: title.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
    }
}

/// Vector index returning a fixed list of chunks, ignoring `top_k`.
#[derive(Debug, Default)]
pub struct StubIndex {
    chunks: Vec<ScoredChunk>,
    calls: AtomicUsize,
    last_top_k: Mutex<Option<usize>>,
}

impl StubIndex {
    pub fn new(chunks: Vec<ScoredChunk>) -> Self {
        Self {
            chunks,
            calls: AtomicUsize::new(0),
            last_top_k: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_top_k(&self) -> Option<usize> {
        *self.last_top_k.lock()
    }
}

#[async_trait]
impl VectorSearch for StubIndex {
    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<ScoredChunk>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_top_k.lock() = Some(top_k);
        Ok(self.chunks.clone())
    }
}

#[derive(Debug)]
pub struct FailingIndex {
    error: ProviderError,
}

impl FailingIndex {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl VectorSearch for FailingIndex {
    async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<ScoredChunk>, ProviderError> {
        Err(self.error.clone())
    }
}

/// Web search returning fixed results, truncated to `max_results`.
#[derive(Debug, Default)]
pub struct StubWebSearch {
    results: Vec<WebSearchResult>,
    calls: AtomicUsize,
}

impl StubWebSearch {
    pub fn new(results: Vec<WebSearchResult>) -> Self {
        Self {
            results,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WebSearch for StubWebSearch {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<WebSearchResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.iter().take(max_results).cloned().collect())
    }
}

#[derive(Debug)]
pub struct FailingWebSearch {
    error: ProviderError,
}

impl FailingWebSearch {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl WebSearch for FailingWebSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<WebSearchResult>, ProviderError> {
        Err(self.error.clone())
    }
}
