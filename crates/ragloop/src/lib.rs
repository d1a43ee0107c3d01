//! Public SDK surface for ragloop.
//!
//! This crate re-exports the building blocks of the query loop and provides
//! helpers to wire an orchestrator from a loaded config.

/// Re-export for convenience.
pub use ragloop_config as config;
pub use ragloop_core as core;
/// Re-export for convenience.
pub use ragloop_memory as memory;
/// Re-export for convenience.
pub use ragloop_protocol as protocol;

pub use ragloop_core::{
    AgentConfig, CancelHandle, LlmSynthesizer, NO_RELEVANT_CONTENT_MESSAGE, QueryError,
    QueryOrchestrator, QueryOutcome, QueryOverrides, QueryResult,
};

use anyhow::Context;
use directories::UserDirs;
use log::info;
use ragloop_config::RagloopConfig;
use ragloop_core::capture_policy_from_settings;
use ragloop_memory::FileTranscriptStore;
use ragloop_protocol::{Synthesizer, VectorSearch, WebSearch};
use std::path::PathBuf;
use std::sync::Arc;

/// Directory under the home directory holding transcripts when none is configured.
const DEFAULT_HISTORY_DIR: &str = ".ragloop/history";

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Build an orchestrator from a loaded config.
///
/// Applies the history capture policy and, when `history.persist` is set,
/// attaches a JSONL transcript and restores the most recent pairs from it.
pub async fn build_agent_from_config(
    config: &RagloopConfig,
    index: Arc<dyn VectorSearch>,
    synthesizer: Arc<dyn Synthesizer>,
    web: Option<Arc<dyn WebSearch>>,
) -> anyhow::Result<QueryOrchestrator> {
    let agent = AgentConfig::from_settings(config).context("invalid agent settings")?;
    let mut orchestrator = QueryOrchestrator::new(agent, index, synthesizer)?
        .with_capture_policy(capture_policy_from_settings(&config.history.capture))?;
    if let Some(web) = web {
        orchestrator = orchestrator.with_web_search(web);
    }
    if config.history.persist {
        let root = transcript_root(config)?;
        let store = FileTranscriptStore::new(&root, &config.history.name)
            .with_context(|| format!("failed to open transcript under {}", root.display()))?;
        orchestrator = orchestrator.with_transcript_store(Arc::new(store));
        let restored = orchestrator.restore_history().await?;
        info!(
            "agent built with persistent history (path={}, restored_pairs={})",
            root.display(),
            restored
        );
    }
    Ok(orchestrator)
}

fn transcript_root(config: &RagloopConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = &config.history.path {
        return Ok(PathBuf::from(path));
    }
    let dirs = UserDirs::new().context("home directory is not available")?;
    Ok(dirs.home_dir().join(DEFAULT_HISTORY_DIR))
}
