//! Best-effort tone classification

use std::sync::Arc;

use crate::config::{OpenAiConfig, ToneConfig};
use crate::logging::preview;
use crate::providers::{CompletionRequest, LlmProvider};
use crate::types::{Outcome, Tone};

use super::prompt::PromptBuilder;

/// Classifies a customer message into one of the [`Tone`] labels
pub struct ToneClassifier {
    llm: Arc<dyn LlmProvider>,
    model: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl ToneClassifier {
    /// Create a classifier using the provider's default model
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        let defaults = ToneConfig::default();
        Self {
            llm,
            model: None,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    pub fn from_config(llm: Arc<dyn LlmProvider>, openai: &OpenAiConfig, tone: &ToneConfig) -> Self {
        Self {
            llm,
            model: Some(openai.tone_model.clone()),
            temperature: tone.temperature,
            max_tokens: tone.max_tokens,
        }
    }

    /// Classify, reporting failures and unknown labels as `Outcome::Degraded`
    pub async fn classify_outcome(&self, message: &str) -> Outcome<Tone> {
        if message.trim().is_empty() {
            return Outcome::Ok(Tone::Neutral);
        }
        tracing::debug!("Analyzing tone for message: '{}...'", preview(message, 50));

        let mut request = CompletionRequest::new(
            PromptBuilder::tone_system_prompt(),
            message,
            self.temperature,
            self.max_tokens,
        );
        if let Some(model) = &self.model {
            request = request.with_model(model.as_str());
        }

        match self.llm.complete(&request).await {
            Ok(answer) => match Tone::parse_label(&answer) {
                Some(tone) => {
                    tracing::debug!("Detected tone: {}", tone);
                    Outcome::Ok(tone)
                }
                None => Outcome::Degraded(format!("Unrecognised tone label '{}'", answer.trim())),
            },
            Err(e) => Outcome::Degraded(format!("Tone analysis failed: {}", e)),
        }
    }

    /// Classify, falling back to [`Tone::Neutral`]
    pub async fn classify(&self, message: &str) -> Tone {
        let outcome = self.classify_outcome(message).await;
        if let Some(reason) = outcome.reason() {
            tracing::warn!("{}, using neutral", reason);
        }
        outcome.value_or_default()
    }
}
