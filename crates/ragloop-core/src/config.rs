//! Runtime settings for a query agent.

use crate::error::QueryError;
use ragloop_config::{CaptureSettings, RagloopConfig};
use ragloop_memory::HistoryCapturePolicy;
use std::time::Duration;

/// Settings a [`crate::QueryOrchestrator`] runs with.
///
/// Values are checked once by [`AgentConfig::validate`] when the orchestrator is
/// built. Only `max_turns` changes afterwards, through
/// [`crate::QueryOrchestrator::set_max_history_turns`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Number of passages requested from the vector index.
    pub top_k: usize,
    /// Minimum similarity a local passage needs to reach the prompt.
    pub similarity_threshold: f32,
    /// Number of question/answer pairs kept in the history window.
    pub max_turns: usize,
    /// Blend web search results into queries by default.
    pub web_search_enabled: bool,
    /// Number of web results requested per query.
    pub web_max_results: usize,
    /// Prompt size budget in characters.
    pub context_budget_chars: usize,
    /// Most recent pairs placed in the prompt; `None` uses the whole window.
    pub history_pairs_in_prompt: Option<usize>,
    /// Per-stage time limit for collaborator calls.
    pub stage_timeout: Option<Duration>,
    /// Instructions placed at the top of every prompt.
    pub instructions: String,
}

/// Instructions used when none are configured.
pub const DEFAULT_INSTRUCTIONS: &str = "Answer the question using the conversation and context below. \
If the context does not contain the answer, say that you do not know.";

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.7,
            max_turns: 10,
            web_search_enabled: false,
            web_max_results: 3,
            context_budget_chars: 12_000,
            history_pairs_in_prompt: None,
            stage_timeout: None,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }
}

impl AgentConfig {
    /// Build agent settings from a loaded config file.
    pub fn from_settings(config: &RagloopConfig) -> Result<Self, QueryError> {
        let agent = &config.agent;
        let settings = Self {
            top_k: agent.top_k,
            similarity_threshold: agent.similarity_threshold,
            max_turns: agent.max_turns,
            web_search_enabled: agent.web_search_enabled,
            web_max_results: agent.web_max_results,
            context_budget_chars: config.context.budget_chars,
            history_pairs_in_prompt: config.context.history_pairs,
            stage_timeout: agent.stage_timeout_ms.map(Duration::from_millis),
            instructions: config
                .context
                .instructions
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check ranges that the query loop depends on.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.top_k == 0 {
            return Err(config_error("top_k must be at least 1"));
        }
        validate_threshold(self.similarity_threshold)?;
        if self.max_turns == 0 {
            return Err(config_error("max_turns must be at least 1"));
        }
        if self.web_max_results == 0 {
            return Err(config_error("web_max_results must be at least 1"));
        }
        if self.context_budget_chars == 0 {
            return Err(config_error("context_budget_chars must be at least 1"));
        }
        if self.stage_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(config_error("stage_timeout must be positive"));
        }
        Ok(())
    }
}

/// Map capture settings from a config file onto the memory crate's policy.
pub fn capture_policy_from_settings(settings: &CaptureSettings) -> HistoryCapturePolicy {
    HistoryCapturePolicy {
        redact_patterns: settings.redact_patterns.clone(),
        detect_secrets: settings.detect_secrets,
        secret_entropy_threshold: settings.secret_entropy_threshold,
        max_message_chars: settings.max_message_chars,
        ..HistoryCapturePolicy::default()
    }
}

pub(crate) fn validate_threshold(threshold: f32) -> Result<(), QueryError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(config_error(&format!(
            "similarity_threshold must be between 0.0 and 1.0 (got {threshold})"
        )))
    }
}

pub(crate) fn config_error(message: &str) -> QueryError {
    QueryError::Configuration(message.to_string())
}
