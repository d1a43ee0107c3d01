//! Synthesizer backed by an AutoAgents LLM provider.

use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::chat::{ChatMessage, ChatRole, MessageType};
use log::debug;
use ragloop_protocol::{ProviderError, Synthesizer};
use std::sync::Arc;

/// Sends the composed prompt as a single user message and returns the reply text.
#[derive(Clone)]
pub struct LlmSynthesizer {
    llm: Arc<dyn LLMProvider>,
    system_prompt: Option<String>,
}

impl LlmSynthesizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self {
            llm,
            system_prompt: None,
        }
    }

    /// Send a system message ahead of every prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    fn messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage {
                role: ChatRole::System,
                message_type: MessageType::Text,
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: ChatRole::User,
            message_type: MessageType::Text,
            content: prompt.to_string(),
        });
        messages
    }
}

#[async_trait]
impl Synthesizer for LlmSynthesizer {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let messages = self.messages(prompt);
        let response = self
            .llm
            .chat_with_tools(&messages, None, None)
            .await
            .map_err(|err| ProviderError::Failed(err.to_string()))?;
        let text = response.text().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::MalformedResponse(
                "model returned an empty reply".to_string(),
            ));
        }
        debug!(
            "llm synthesis finished (prompt_chars={}, answer_chars={})",
            prompt.chars().count(),
            text.chars().count()
        );
        Ok(text)
    }
}
