//! Config errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading or checking a ragloop config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file or the working directory could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A layer is not valid JSON5.
    #[error("{origin} is not valid JSON5: {source}")]
    Syntax {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged document does not deserialize into `RagloopConfig`.
    #[error("config does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
    /// A value failed schema or range validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}
