//! Error types for history operations.

/// Errors returned by the turn window, capture policy, and transcript stores.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),
    /// Window capacity must hold at least one pair.
    #[error("max_turns must be at least 1 (got {0})")]
    InvalidCapacity(usize),
}
