//! Configuration schema for ragloop.

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Root config for a ragloop query agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagloopConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

impl RagloopConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> RagloopConfigBuilder {
        RagloopConfigBuilder::new()
    }

    /// Validate invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if agent.top_k == 0 {
            return Err(invalid("agent.top_k", "must be at least 1"));
        }
        if !agent.similarity_threshold.is_finite()
            || !(0.0..=1.0).contains(&agent.similarity_threshold)
        {
            return Err(invalid(
                "agent.similarity_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        if agent.max_turns == 0 {
            return Err(invalid("agent.max_turns", "must be at least 1"));
        }
        if agent.web_max_results == 0 {
            return Err(invalid("agent.web_max_results", "must be at least 1"));
        }
        if agent.stage_timeout_ms == Some(0) {
            return Err(invalid("agent.stage_timeout_ms", "must be positive"));
        }
        if self.context.budget_chars == 0 {
            return Err(invalid("context.budget_chars", "must be at least 1"));
        }
        let threshold = self.history.capture.secret_entropy_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid(
                "history.capture.secret_entropy_threshold",
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

fn invalid(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Builder for assembling a `RagloopConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct RagloopConfigBuilder {
    config: RagloopConfig,
}

impl RagloopConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: RagloopConfig::default(),
        }
    }

    /// Replace the retrieval and history window settings.
    pub fn agent(mut self, agent: AgentSettings) -> Self {
        self.config.agent = agent;
        self
    }

    /// Replace the prompt composition settings.
    pub fn context(mut self, context: ContextSettings) -> Self {
        self.config.context = context;
        self
    }

    /// Replace the history persistence settings.
    pub fn history(mut self, history: HistorySettings) -> Self {
        self.config.history = history;
        self
    }

    /// Finalize and validate the built config.
    pub fn build(self) -> Result<RagloopConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Retrieval and history window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default)]
    pub web_search_enabled: bool,
    #[serde(default = "default_web_max_results")]
    pub web_max_results: usize,
    #[serde(default)]
    pub stage_timeout_ms: Option<u64>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            max_turns: default_max_turns(),
            web_search_enabled: false,
            web_max_results: default_web_max_results(),
            stage_timeout_ms: None,
        }
    }
}

/// Default number of passages requested per query.
fn default_top_k() -> usize {
    5
}

/// Default minimum similarity for local passages.
fn default_similarity_threshold() -> f32 {
    0.7
}

/// Default number of question/answer pairs kept in history.
fn default_max_turns() -> usize {
    10
}

/// Default number of web results blended into a query.
fn default_web_max_results() -> usize {
    3
}

/// Prompt composition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSettings {
    #[serde(default = "default_budget_chars")]
    pub budget_chars: usize,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub history_pairs: Option<usize>,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            budget_chars: default_budget_chars(),
            instructions: None,
            history_pairs: None,
        }
    }
}

/// Default prompt size budget in characters.
fn default_budget_chars() -> usize {
    12_000
}

/// History persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default)]
    pub persist: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_transcript_name")]
    pub name: String,
    #[serde(default)]
    pub capture: CaptureSettings,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            persist: false,
            path: None,
            name: default_transcript_name(),
            capture: CaptureSettings::default(),
        }
    }
}

/// Default transcript file stem.
fn default_transcript_name() -> String {
    "transcript".to_string()
}

/// Sanitisation applied to turns before they are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    #[serde(default)]
    pub redact_patterns: Vec<String>,
    #[serde(default = "default_detect_secrets")]
    pub detect_secrets: bool,
    #[serde(default = "default_secret_entropy_threshold")]
    pub secret_entropy_threshold: f32,
    #[serde(default)]
    pub max_message_chars: Option<usize>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            redact_patterns: Vec::new(),
            detect_secrets: default_detect_secrets(),
            secret_entropy_threshold: default_secret_entropy_threshold(),
            max_message_chars: None,
        }
    }
}

/// Default toggle for secret detection in history capture.
fn default_detect_secrets() -> bool {
    true
}

/// Default entropy threshold for identifying secrets.
fn default_secret_entropy_threshold() -> f32 {
    3.7
}
