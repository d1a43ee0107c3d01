//! Query orchestrator: runs one retrieval-augmented query through its stages and
//! owns the conversation window.

mod cancel;
mod result;
mod stage;

pub use cancel::CancelHandle;
pub use result::{
    NO_RELEVANT_CONTENT_MESSAGE, QueryMetadata, QueryOutcome, QueryOverrides, QueryResult,
};

use crate::composer::ContextComposer;
use crate::config::{AgentConfig, config_error, validate_threshold};
use crate::error::QueryError;
use crate::filter::{cap_to_top_k, filter_by_threshold};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use ragloop_memory::{HistoryCapturePolicy, TranscriptStore, Turn, TurnPair, TurnStore};
use ragloop_protocol::{
    EventPayload, EventSink, QueryMode, QueryStage, RetrievedPassage, ScoredChunk, Synthesizer,
    VectorSearch, WebSearch, WebSearchResult,
};
use stage::{StageTracker, with_stage_timeout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Settings resolved for a single query.
#[derive(Debug, Clone, Copy)]
struct QueryPlan {
    mode: QueryMode,
    top_k: usize,
    threshold: f32,
    web_enabled: bool,
    web_max_results: usize,
    timeout: Option<Duration>,
}

/// Runs queries against a vector index, optional web search, and a synthesizer,
/// keeping a bounded window of answered turns.
///
/// Stages run in order: retrieving, filtering, composing, synthesizing. A RAG
/// query left without passages, either after filtering or after budget
/// truncation, stops early with [`NO_RELEVANT_CONTENT_MESSAGE`] and never
/// reaches the synthesizer. History is appended exactly once per answered query
/// and is left untouched by failures, cancellations, and empty results.
///
/// Answered pairs enter the window and the transcript in the same order.
pub struct QueryOrchestrator {
    config: RwLock<AgentConfig>,
    index: Arc<dyn VectorSearch>,
    synthesizer: Arc<dyn Synthesizer>,
    web: Option<Arc<dyn WebSearch>>,
    history: Mutex<TurnStore>,
    record_lock: tokio::sync::Mutex<()>,
    capture_policy: HistoryCapturePolicy,
    transcript: Option<Arc<dyn TranscriptStore>>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl QueryOrchestrator {
    /// Create an orchestrator over the given index and synthesizer.
    pub fn new(
        config: AgentConfig,
        index: Arc<dyn VectorSearch>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Result<Self, QueryError> {
        config.validate()?;
        let history = TurnStore::new(config.max_turns)
            .map_err(|err| QueryError::Configuration(err.to_string()))?;
        info!(
            "query orchestrator initialized (top_k={}, similarity_threshold={}, max_turns={}, web_search_enabled={})",
            config.top_k, config.similarity_threshold, config.max_turns, config.web_search_enabled
        );
        Ok(Self {
            config: RwLock::new(config),
            index,
            synthesizer,
            web: None,
            history: Mutex::new(history),
            record_lock: tokio::sync::Mutex::new(()),
            capture_policy: HistoryCapturePolicy::passthrough(),
            transcript: None,
            event_sink: None,
        })
    }

    /// Attach a web search provider.
    pub fn with_web_search(mut self, web: Arc<dyn WebSearch>) -> Self {
        self.web = Some(web);
        self
    }

    /// Attach a sink receiving query lifecycle events.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Mirror answered turns and clears into a transcript store.
    pub fn with_transcript_store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.transcript = Some(store);
        self
    }

    /// Sanitize question and answer text before it enters history.
    pub fn with_capture_policy(
        mut self,
        policy: HistoryCapturePolicy,
    ) -> Result<Self, QueryError> {
        policy
            .validate()
            .map_err(|err| QueryError::Configuration(err.to_string()))?;
        self.capture_policy = policy;
        Ok(self)
    }

    /// Snapshot of the current settings.
    pub fn config(&self) -> AgentConfig {
        self.config.read().clone()
    }

    /// Answer a question from local passages, blending in web results when enabled.
    pub async fn query(
        &self,
        question: &str,
        overrides: QueryOverrides,
    ) -> Result<QueryResult, QueryError> {
        self.run(question, QueryMode::Rag, overrides, &CancelHandle::new())
            .await
    }

    /// Answer a question without local retrieval.
    pub async fn query_direct(
        &self,
        question: &str,
        enable_web_search: bool,
    ) -> Result<QueryResult, QueryError> {
        let overrides = QueryOverrides::default().with_web_search(enable_web_search);
        self.run(question, QueryMode::Direct, overrides, &CancelHandle::new())
            .await
    }

    /// Run a query that stops at the next stage boundary once `cancel` fires.
    pub async fn query_with_cancel(
        &self,
        question: &str,
        mode: QueryMode,
        overrides: QueryOverrides,
        cancel: &CancelHandle,
    ) -> Result<QueryResult, QueryError> {
        self.run(question, mode, overrides, cancel).await
    }

    /// Turns ordered oldest to newest; `max_turns` keeps only the most recent pairs.
    pub fn get_history(&self, max_turns: Option<usize>) -> Vec<Turn> {
        self.history.lock().history(max_turns)
    }

    /// Resize the history window, evicting the oldest pairs immediately.
    ///
    /// Returns the number of evicted pairs.
    pub fn set_max_history_turns(&self, max_turns: usize) -> Result<usize, QueryError> {
        if max_turns == 0 {
            return Err(config_error("max_turns must be at least 1"));
        }
        let mut config = self.config.write();
        let evicted = self
            .history
            .lock()
            .set_max_turns(max_turns)
            .map_err(|err| QueryError::Configuration(err.to_string()))?;
        config.max_turns = max_turns;
        info!(
            "history window resized (max_turns={}, evicted={})",
            max_turns, evicted
        );
        Ok(evicted)
    }

    /// Empty the history window and the transcript, if one is attached.
    pub async fn clear_history(&self) -> Result<(), QueryError> {
        let _ordered = self.record_lock.lock().await;
        self.history.lock().clear();
        if let Some(store) = &self.transcript {
            store.clear().await?;
        }
        info!("history cleared");
        Ok(())
    }

    /// Seed the history window from the transcript store.
    ///
    /// Returns the number of restored pairs; zero when no store is attached.
    pub async fn restore_history(&self) -> Result<usize, QueryError> {
        let Some(store) = &self.transcript else {
            return Ok(0);
        };
        let _ordered = self.record_lock.lock().await;
        let limit = self.config.read().max_turns;
        let pairs = store.load_recent(limit).await?;
        let restored = {
            let mut history = self.history.lock();
            history.restore(pairs);
            history.pair_count()
        };
        match store.compact(limit).await {
            Ok(removed) if removed > 0 => {
                debug!("transcript compacted on restore (removed_pairs={})", removed)
            }
            Ok(_) => {}
            Err(err) => warn!("failed to compact transcript (error={})", err),
        }
        info!("history restored from transcript (pairs={})", restored);
        Ok(restored)
    }

    async fn run(
        &self,
        question: &str,
        mode: QueryMode,
        overrides: QueryOverrides,
        cancel: &CancelHandle,
    ) -> Result<QueryResult, QueryError> {
        let started = Instant::now();
        let query_id = Uuid::new_v4();
        let mut tracker = StageTracker::new(query_id, self.event_sink.clone());
        info!(
            "query started (query_id={}, mode={}, question_len={})",
            query_id,
            mode,
            question.len()
        );
        tracker.emit(EventPayload::QueryStarted {
            mode,
            question_len: question.len(),
        });

        let outcome = self
            .execute(&mut tracker, question, mode, overrides, cancel)
            .await;
        match outcome {
            Ok(mut result) => {
                result.metadata.query_id = query_id;
                result.metadata.elapsed = started.elapsed();
                info!(
                    "query completed (query_id={}, outcome={:?}, sources={}, elapsed_ms={})",
                    query_id,
                    result.metadata.outcome,
                    result.metadata.source_count,
                    result.metadata.elapsed.as_millis()
                );
                tracker.emit(EventPayload::QueryCompleted {
                    answered: result.is_answered(),
                    source_count: result.metadata.source_count,
                    web_source_count: result.metadata.web_source_count,
                    elapsed_ms: u64::try_from(result.metadata.elapsed.as_millis())
                        .unwrap_or(u64::MAX),
                });
                Ok(result)
            }
            Err(err) => {
                warn!(
                    "query failed (query_id={}, stage={}, error={})",
                    query_id,
                    err.stage(),
                    err
                );
                tracker.fail(&err);
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        tracker: &mut StageTracker,
        question: &str,
        mode: QueryMode,
        overrides: QueryOverrides,
        cancel: &CancelHandle,
    ) -> Result<QueryResult, QueryError> {
        let config = self.config();
        let plan = self.plan(&config, mode, &overrides)?;

        tracker.advance(QueryStage::Retrieving);
        ensure_active(cancel, tracker.stage())?;
        let (chunks, web_results) = with_stage_timeout(
            QueryStage::Retrieving,
            plan.timeout,
            self.retrieve(question, &plan),
        )
        .await?;
        ensure_active(cancel, tracker.stage())?;

        tracker.advance(QueryStage::Filtering);
        let retrieved = chunks.len();
        let local = filter_by_threshold(
            cap_to_top_k(
                chunks.into_iter().map(RetrievedPassage::from).collect(),
                plan.top_k,
            ),
            plan.threshold,
        );
        let web: Vec<RetrievedPassage> = web_results
            .into_iter()
            .take(plan.web_max_results)
            .map(RetrievedPassage::from)
            .collect();
        debug!(
            "passages filtered (retrieved={}, kept={}, web={}, threshold={})",
            retrieved,
            local.len(),
            web.len(),
            plan.threshold
        );
        tracker.emit(EventPayload::PassagesFiltered {
            retrieved,
            kept: local.len(),
            threshold: plan.threshold,
        });

        if plan.mode == QueryMode::Rag && local.is_empty() && web.is_empty() {
            tracker.advance(QueryStage::EmptyResult);
            return Ok(empty_result(plan.mode));
        }

        tracker.advance(QueryStage::Composing);
        let history = self.history.lock().pairs(config.history_pairs_in_prompt);
        let composer = ContextComposer::new(
            config.instructions.as_str(),
            config.context_budget_chars,
            plan.top_k,
        );
        let prompt = composer.compose(question, &local, &web, &history);
        if prompt.truncation.over_budget {
            warn!(
                "prompt exceeds budget after truncation (prompt_chars={}, budget_chars={})",
                prompt.char_len(),
                composer.budget_chars()
            );
        }
        tracker.emit(EventPayload::ContextComposed {
            prompt_chars: prompt.char_len(),
            dropped_web: prompt.truncation.dropped_web,
            dropped_local: prompt.truncation.dropped_local,
            dropped_history_pairs: prompt.truncation.dropped_history_pairs,
        });
        if plan.mode == QueryMode::Rag
            && prompt.included_local.is_empty()
            && prompt.included_web.is_empty()
        {
            debug!("no passages survived truncation; skipping synthesis");
            tracker.advance(QueryStage::EmptyResult);
            let mut result = empty_result(plan.mode);
            result.metadata.truncation = prompt.truncation;
            return Ok(result);
        }

        tracker.advance(QueryStage::Synthesizing);
        ensure_active(cancel, tracker.stage())?;
        let answer = with_stage_timeout(QueryStage::Synthesizing, plan.timeout, async {
            self.synthesizer
                .complete(&prompt.text)
                .await
                .map_err(QueryError::Synthesis)
        })
        .await?;
        ensure_active(cancel, tracker.stage())?;

        self.record_turn(question, &answer).await?;
        tracker.advance(QueryStage::Done);

        let web_source_count = prompt.included_web.len();
        let mut passages = prompt.included_local;
        passages.extend(prompt.included_web);
        Ok(QueryResult {
            answer,
            metadata: QueryMetadata {
                query_id: Uuid::nil(),
                elapsed: Duration::ZERO,
                source_count: passages.len(),
                web_source_count,
                outcome: QueryOutcome::Answered,
                mode: plan.mode,
                truncation: prompt.truncation,
            },
            passages,
        })
    }

    fn plan(
        &self,
        config: &AgentConfig,
        mode: QueryMode,
        overrides: &QueryOverrides,
    ) -> Result<QueryPlan, QueryError> {
        let top_k = overrides.top_k.unwrap_or(config.top_k);
        if top_k == 0 {
            return Err(config_error("top_k must be at least 1"));
        }
        let threshold = overrides
            .similarity_threshold
            .unwrap_or(config.similarity_threshold);
        validate_threshold(threshold)?;
        let web_enabled = overrides
            .enable_web_search
            .unwrap_or(config.web_search_enabled);
        if web_enabled && self.web.is_none() {
            return Err(config_error(
                "web search requested but no web search provider is attached",
            ));
        }
        Ok(QueryPlan {
            mode,
            top_k,
            threshold,
            web_enabled,
            web_max_results: config.web_max_results,
            timeout: config.stage_timeout,
        })
    }

    async fn retrieve(
        &self,
        question: &str,
        plan: &QueryPlan,
    ) -> Result<(Vec<ScoredChunk>, Vec<WebSearchResult>), QueryError> {
        let local = async {
            if plan.mode == QueryMode::Direct {
                return Ok(Vec::new());
            }
            self.index
                .search(question, plan.top_k)
                .await
                .map_err(QueryError::Retrieval)
        };
        let web = async {
            match &self.web {
                Some(provider) if plan.web_enabled => provider
                    .search(question, plan.web_max_results)
                    .await
                    .map_err(QueryError::WebSearch),
                _ => Ok(Vec::new()),
            }
        };
        tokio::try_join!(local, web)
    }

    /// Append the answered pair to the window and mirror it to the transcript.
    ///
    /// `record_lock` is held across both writes so the transcript keeps the
    /// window's order under concurrent queries.
    async fn record_turn(&self, question: &str, answer: &str) -> Result<(), QueryError> {
        let pair = TurnPair::new(
            self.capture_policy.apply(question)?,
            self.capture_policy.apply(answer)?,
        );
        let _ordered = self.record_lock.lock().await;
        self.history.lock().push_pair(pair.clone());
        if let Some(store) = &self.transcript
            && let Err(err) = store.append_pair(&pair).await
        {
            warn!("failed to persist transcript pair (error={})", err);
        }
        Ok(())
    }
}

fn ensure_active(cancel: &CancelHandle, stage: QueryStage) -> Result<(), QueryError> {
    if cancel.is_cancelled() {
        return Err(QueryError::Cancelled { stage });
    }
    Ok(())
}

fn empty_result(mode: QueryMode) -> QueryResult {
    QueryResult {
        answer: NO_RELEVANT_CONTENT_MESSAGE.to_string(),
        passages: Vec::new(),
        metadata: QueryMetadata {
            query_id: Uuid::nil(),
            elapsed: Duration::ZERO,
            source_count: 0,
            web_source_count: 0,
            outcome: QueryOutcome::NoRelevantContent,
            mode,
            truncation: Default::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryOrchestrator, QueryOverrides};
    use crate::{AgentConfig, QueryError};
    use pretty_assertions::assert_eq;
    use ragloop_protocol::QueryMode;
    use ragloop_test_utils::{StubIndex, StubSynthesizer, StubWebSearch};
    use std::sync::Arc;

    fn orchestrator(config: AgentConfig) -> QueryOrchestrator {
        QueryOrchestrator::new(
            config,
            Arc::new(StubIndex::new(Vec::new())),
            Arc::new(StubSynthesizer::new("answer")),
        )
        .expect("orchestrator")
    }

    #[test]
    fn new_rejects_zero_max_turns() {
        let result = QueryOrchestrator::new(
            AgentConfig {
                max_turns: 0,
                ..AgentConfig::default()
            },
            Arc::new(StubIndex::new(Vec::new())),
            Arc::new(StubSynthesizer::new("answer")),
        );
        assert!(matches!(result, Err(QueryError::Configuration(_))));
    }

    #[test]
    fn plan_applies_overrides() {
        let orchestrator = orchestrator(AgentConfig::default())
            .with_web_search(Arc::new(StubWebSearch::new(Vec::new())));
        let config = orchestrator.config();
        let plan = orchestrator
            .plan(
                &config,
                QueryMode::Rag,
                &QueryOverrides::default()
                    .with_top_k(2)
                    .with_similarity_threshold(0.3)
                    .with_web_search(true),
            )
            .expect("plan");
        assert_eq!(plan.top_k, 2);
        assert_eq!(plan.threshold, 0.3);
        assert_eq!(plan.web_enabled, true);
        assert_eq!(orchestrator.config().top_k, 5);
    }

    #[test]
    fn plan_rejects_invalid_overrides() {
        let orchestrator = orchestrator(AgentConfig::default());
        let config = orchestrator.config();
        for overrides in [
            QueryOverrides::default().with_top_k(0),
            QueryOverrides::default().with_similarity_threshold(1.5),
            QueryOverrides::default().with_web_search(true),
        ] {
            let err = orchestrator
                .plan(&config, QueryMode::Rag, &overrides)
                .unwrap_err();
            assert!(matches!(err, QueryError::Configuration(_)));
        }
    }

    #[test]
    fn resizing_to_zero_is_rejected() {
        let orchestrator = orchestrator(AgentConfig::default());
        assert!(matches!(
            orchestrator.set_max_history_turns(0),
            Err(QueryError::Configuration(_))
        ));
        assert_eq!(orchestrator.config().max_turns, 10);
    }
}
