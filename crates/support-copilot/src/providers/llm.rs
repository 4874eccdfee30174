//! LLM provider trait for chat-style completions

use async_trait::async_trait;
use crate::error::Result;

/// A single chat completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model override; the provider default is used when `None`
    pub model: Option<String>,
    /// System instruction
    pub system: String,
    /// User message
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token bound
    pub max_tokens: u32,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

impl CompletionRequest {
    /// Create a request with no penalties and the provider's default model
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: None,
            system: system.into(),
            user: user.into(),
            temperature,
            max_tokens,
            presence_penalty: None,
            frequency_penalty: None,
        }
    }

    /// Use a specific model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set presence and frequency penalties
    pub fn with_penalties(mut self, presence: f32, frequency: f32) -> Self {
        self.presence_penalty = Some(presence);
        self.frequency_penalty = Some(frequency);
        self
    }
}

/// Trait for chat completion backends
///
/// Implementations:
/// - `OpenAiClient`: OpenAI chat completions (gpt-4, gpt-3.5-turbo)
///
/// Implementations report HTTP 429 as `Error::RateLimited` and connection
/// failures as `Error::Unavailable` so callers can decide whether to retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion and return the generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &'static str;

    /// Get the default model
    fn model(&self) -> &str;
}
