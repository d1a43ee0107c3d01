//! Conversation history for ragloop: the bounded turn window, capture policy,
//! and transcript persistence.

pub mod error;
pub mod model;
pub mod policy;
pub mod transcript;
pub mod window;

/// Memory error type.
pub use error::MemoryError;
/// Turn model.
pub use model::{Role, Turn, TurnPair, estimate_tokens};
/// Capture policy applied before turns are stored.
pub use policy::HistoryCapturePolicy;
/// Transcript persistence interface and default file implementation.
pub use transcript::{FileTranscriptStore, TranscriptStore};
/// Bounded turn window.
pub use window::TurnStore;
