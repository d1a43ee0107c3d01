use async_trait::async_trait;
use ragloop_memory::{MemoryError, TranscriptStore, TurnPair};
use std::io;

/// Transcript store whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingTranscriptStore;

fn unavailable() -> MemoryError {
    MemoryError::Io(io::Error::other("transcript unavailable"))
}

#[async_trait]
impl TranscriptStore for FailingTranscriptStore {
    async fn append_pair(&self, _pair: &TurnPair) -> Result<(), MemoryError> {
        Err(unavailable())
    }

    async fn load_recent(&self, _limit: usize) -> Result<Vec<TurnPair>, MemoryError> {
        Ok(Vec::new())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        Err(unavailable())
    }
}
