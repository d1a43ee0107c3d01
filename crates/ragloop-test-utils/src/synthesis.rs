use async_trait::async_trait;
use parking_lot::Mutex;
use ragloop_protocol::{ProviderError, Synthesizer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Synthesizer returning a fixed answer and recording every prompt.
#[derive(Debug, Default)]
pub struct StubSynthesizer {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl StubSynthesizer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

#[derive(Debug)]
pub struct FailingSynthesizer {
    error: ProviderError,
    calls: AtomicUsize,
}

impl FailingSynthesizer {
    pub fn new(error: ProviderError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for FailingSynthesizer {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Synthesizer that sleeps before answering.
#[derive(Debug)]
pub struct SlowSynthesizer {
    delay: Duration,
    answer: String,
}

impl SlowSynthesizer {
    pub fn new(delay: Duration, answer: impl Into<String>) -> Self {
        Self {
            delay,
            answer: answer.into(),
        }
    }
}

#[async_trait]
impl Synthesizer for SlowSynthesizer {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.answer.clone())
    }
}

/// Synthesizer answering with the question it found at the end of the prompt.
#[derive(Debug, Default)]
pub struct EchoSynthesizer;

impl EchoSynthesizer {
    pub fn answer_for(question: &str) -> String {
        format!("answer to {question}")
    }
}

#[async_trait]
impl Synthesizer for EchoSynthesizer {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        tokio::task::yield_now().await;
        let question = prompt
            .rsplit_once("## Question\n")
            .map(|(_, question)| question)
            .ok_or_else(|| ProviderError::MalformedResponse("prompt has no question".into()))?;
        Ok(Self::answer_for(question))
    }
}
