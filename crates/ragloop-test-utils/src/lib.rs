//! Test helpers shared across ragloop crates.

pub mod events;
pub mod llm;
pub mod retrieval;
pub mod synthesis;
pub mod transcript;

pub use events::RecordingEventSink;
pub use llm::ScriptedLLM;
pub use retrieval::{FailingIndex, FailingWebSearch, StubIndex, StubWebSearch, chunk, web_result};
pub use synthesis::{EchoSynthesizer, FailingSynthesizer, SlowSynthesizer, StubSynthesizer};
pub use transcript::FailingTranscriptStore;
