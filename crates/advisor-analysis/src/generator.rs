//! Text generation collaborator

use crate::advisory::AdvisorySynthesizer;
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use advisor_llm::{CompletionRequest, LLMProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Turns a prompt into free-text advice
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// [`TextGenerator`] backed by any chat-completion provider
pub struct LlmTextGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    temperature: f32,
    system_prompt: String,
}

impl LlmTextGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 1000,
            temperature: 0.5,
            system_prompt: AdvisorySynthesizer::new().system_prompt().to_string(),
        }
    }

    /// Model, token budget and temperature from configuration
    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &AdvisorConfig) -> Self {
        Self::new(provider, config.model.clone())
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature)
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    fn request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest::builder(self.model.clone())
            .system(self.system_prompt.clone())
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    #[instrument(skip(self, prompt), fields(provider = self.provider.name(), model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.provider.complete(self.request(prompt)).await?;
        debug!(
            stop_reason = ?response.stop_reason,
            tokens = response.usage.total(),
            "Received advice"
        );

        response
            .message
            .text()
            .map(ToString::to_string)
            .ok_or_else(|| {
                AdvisorError::TextGenerationFailed("provider returned no text".to_string())
            })
    }
}
