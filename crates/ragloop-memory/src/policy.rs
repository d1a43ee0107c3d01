//! Capture policy applied to question/answer text before it enters history.

use crate::error::MemoryError;
use regex::Regex;

/// Policy for sanitising turn content before storage.
#[derive(Debug, Clone)]
pub struct HistoryCapturePolicy {
    /// Patterns to redact from captured content.
    pub redact_patterns: Vec<String>,
    /// Detect secrets using entropy heuristics.
    pub detect_secrets: bool,
    /// Entropy threshold for secret detection.
    pub secret_entropy_threshold: f32,
    /// Optional maximum length per stored turn.
    pub max_message_chars: Option<usize>,
    /// Replacement string for redactions.
    pub redaction_replacement: String,
}

impl Default for HistoryCapturePolicy {
    fn default() -> Self {
        Self {
            redact_patterns: Vec::new(),
            detect_secrets: true,
            secret_entropy_threshold: 3.7,
            max_message_chars: None,
            redaction_replacement: "[REDACTED]".to_string(),
        }
    }
}

impl HistoryCapturePolicy {
    /// Policy that stores content verbatim.
    pub fn passthrough() -> Self {
        Self {
            detect_secrets: false,
            ..Self::default()
        }
    }

    /// Apply redaction, secret detection, and truncation to a turn's content.
    pub fn apply(&self, content: &str) -> Result<String, MemoryError> {
        let mut content = content.to_string();

        for pattern in &self.redact_patterns {
            let regex = Regex::new(pattern).map_err(|err| MemoryError::Regex(err.to_string()))?;
            content = regex
                .replace_all(&content, self.redaction_replacement.as_str())
                .to_string();
        }

        if self.detect_secrets {
            content = redact_high_entropy(
                &content,
                self.secret_entropy_threshold,
                self.redaction_replacement.as_str(),
            );
        }

        if let Some(max_chars) = self.max_message_chars {
            content = truncate_chars(&content, max_chars);
        }

        Ok(content)
    }

    /// Compile every redaction pattern once so config errors surface early.
    pub fn validate(&self) -> Result<(), MemoryError> {
        for pattern in &self.redact_patterns {
            Regex::new(pattern).map_err(|err| MemoryError::Regex(err.to_string()))?;
        }
        Ok(())
    }
}

/// Truncate a string to a maximum character count.
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}

/// Redact high-entropy tokens that resemble secrets.
fn redact_high_entropy(content: &str, threshold: f32, replacement: &str) -> String {
    let Ok(regex) = Regex::new(r"[A-Za-z0-9+/=_\-]{20,}") else {
        return content.to_string();
    };
    regex
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let token = caps.get(0).map_or("", |m| m.as_str());
            if shannon_entropy(token) >= threshold {
                replacement.to_string()
            } else {
                token.to_string()
            }
        })
        .to_string()
}

/// Shannon entropy over the token's bytes.
fn shannon_entropy(token: &str) -> f32 {
    let mut counts = [0usize; 256];
    let bytes = token.as_bytes();
    if bytes.is_empty() {
        return 0.0;
    }
    for byte in bytes {
        counts[*byte as usize] += 1;
    }
    let len = bytes.len() as f32;
    let mut entropy = 0.0;
    for count in counts.iter().copied().filter(|count| *count > 0) {
        let p = count as f32 / len;
        entropy -= p * p.log2();
    }
    entropy
}
