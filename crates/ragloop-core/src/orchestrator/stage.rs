//! Stage bookkeeping for a running query.

use crate::error::QueryError;
use log::debug;
use ragloop_protocol::{EventMsg, EventPayload, EventSink, QueryId, QueryStage};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Tracks the current stage, logging and emitting every transition.
pub(super) struct StageTracker {
    query_id: QueryId,
    stage: QueryStage,
    sink: Option<Arc<dyn EventSink>>,
}

impl StageTracker {
    pub(super) fn new(query_id: QueryId, sink: Option<Arc<dyn EventSink>>) -> Self {
        Self {
            query_id,
            stage: QueryStage::Idle,
            sink,
        }
    }

    pub(super) fn stage(&self) -> QueryStage {
        self.stage
    }

    pub(super) fn advance(&mut self, to: QueryStage) {
        let from = self.stage;
        self.stage = to;
        debug!(
            "query stage changed (query_id={}, from={}, to={})",
            self.query_id, from, to
        );
        self.emit(EventPayload::StageChanged { from, to });
    }

    /// Record a failure. Only retrieval and synthesis move the machine to `Failed`.
    pub(super) fn fail(&mut self, err: &QueryError) {
        if matches!(
            self.stage,
            QueryStage::Retrieving | QueryStage::Synthesizing
        ) {
            self.advance(QueryStage::Failed);
        }
        self.emit(EventPayload::QueryFailed {
            stage: err.stage(),
            message: err.to_string(),
        });
    }

    pub(super) fn emit(&self, payload: EventPayload) {
        if let Some(sink) = &self.sink {
            sink.emit(EventMsg::new(self.query_id, payload));
        }
    }
}

/// Run a stage future under an optional time limit.
pub(super) async fn with_stage_timeout<T, F>(
    stage: QueryStage,
    limit: Option<Duration>,
    future: F,
) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, QueryError>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, future)
            .await
            .map_err(|_| QueryError::Timeout { stage, after })?,
        None => future.await,
    }
}
