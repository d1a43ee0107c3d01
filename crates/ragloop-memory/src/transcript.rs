//! Transcript persistence for completed question/answer pairs.

use crate::error::MemoryError;
use crate::model::{Turn, TurnPair};
use async_trait::async_trait;
use log::{debug, info};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Durable store for conversation history.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Persist one completed pair.
    async fn append_pair(&self, pair: &TurnPair) -> Result<(), MemoryError>;

    /// Load up to `limit` of the most recent pairs, oldest first.
    async fn load_recent(&self, limit: usize) -> Result<Vec<TurnPair>, MemoryError>;

    /// Drop all persisted pairs.
    async fn clear(&self) -> Result<(), MemoryError>;

    /// Keep only the most recent `keep` pairs. Returns the number removed.
    async fn compact(&self, keep: usize) -> Result<usize, MemoryError> {
        let _ = keep;
        Ok(0)
    }
}

/// File-backed transcript storing one JSON turn per line.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    /// Transcript file path.
    path: PathBuf,
}

impl FileTranscriptStore {
    /// Create a transcript named `name` under the given root directory.
    pub fn new(root: impl AsRef<Path>, name: &str) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        let path = root.join(format!("{name}.jsonl"));
        info!("initialized file transcript store (path={})", path.display());
        Ok(Self { path })
    }

    /// Path of the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path to the temporary rewrite file.
    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("jsonl.tmp")
    }

    /// Load every persisted pair.
    fn load_pairs(&self) -> Result<Vec<TurnPair>, MemoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(&self.path)?;
        let reader = BufReader::new(file);
        let mut turns = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let turn: Turn = serde_json::from_str(&line)?;
            turns.push(turn);
        }
        Ok(TurnPair::from_turns(turns))
    }

    /// Rewrite the transcript atomically.
    fn write_pairs(&self, pairs: &[TurnPair]) -> Result<(), MemoryError> {
        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            for pair in pairs {
                writeln!(file, "{}", serde_json::to_string(&pair.user)?)?;
                writeln!(file, "{}", serde_json::to_string(&pair.assistant)?)?;
            }
        }
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        std::fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn append_pair(&self, pair: &TurnPair) -> Result<(), MemoryError> {
        let user = serde_json::to_string(&pair.user)?;
        let assistant = serde_json::to_string(&pair.assistant)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // One write keeps the pair together on disk.
        write!(file, "{user}\n{assistant}\n")?;
        debug!(
            "stored transcript pair (question_len={}, answer_len={})",
            pair.question().len(),
            pair.answer().len()
        );
        Ok(())
    }

    async fn load_recent(&self, limit: usize) -> Result<Vec<TurnPair>, MemoryError> {
        let pairs = self.load_pairs()?;
        let start = pairs.len().saturating_sub(limit);
        debug!(
            "loaded transcript (stored={}, returned={})",
            pairs.len(),
            pairs.len() - start
        );
        Ok(pairs[start..].to_vec())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.write_pairs(&[])?;
        info!("transcript cleared (path={})", self.path.display());
        Ok(())
    }

    async fn compact(&self, keep: usize) -> Result<usize, MemoryError> {
        let pairs = self.load_pairs()?;
        let removed = pairs.len().saturating_sub(keep);
        if removed == 0 {
            return Ok(0);
        }
        self.write_pairs(&pairs[removed..])?;
        info!(
            "transcript compacted (path={}, removed={}, kept={})",
            self.path.display(),
            removed,
            keep
        );
        Ok(removed)
    }
}
