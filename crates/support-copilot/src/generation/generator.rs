//! Grounded reply generation with bounded retry and a fallback reply

use std::sync::Arc;

use crate::config::{GenerationConfig, OpenAiConfig};
use crate::error::{Error, Result};
use crate::logging::preview;
use crate::providers::{CompletionRequest, LlmProvider, Sleeper, TokioSleeper};
use crate::types::{GenerationResult, RetrievedMatch};

use super::prompt::{PromptBuilder, SYSTEM_PROMPT};
use super::retry::RetryPolicy;

/// Drafts support replies from an issue, retrieved context and a tone
pub struct ResponseGenerator {
    llm: Arc<dyn LlmProvider>,
    model: Option<String>,
    temperature: f32,
    max_tokens: u32,
    presence_penalty: f32,
    frequency_penalty: f32,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ResponseGenerator {
    /// Create a generator with default sampling and a two-attempt budget
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        let defaults = GenerationConfig::default();
        Self {
            llm,
            model: None,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            presence_penalty: defaults.presence_penalty,
            frequency_penalty: defaults.frequency_penalty,
            policy: RetryPolicy::from_config(&defaults),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn from_config(
        llm: Arc<dyn LlmProvider>,
        openai: &OpenAiConfig,
        generation: &GenerationConfig,
    ) -> Self {
        Self {
            model: Some(openai.generation_model.clone()),
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            presence_penalty: generation.presence_penalty,
            frequency_penalty: generation.frequency_penalty,
            policy: RetryPolicy::from_config(generation),
            ..Self::new(llm)
        }
    }

    /// Replace the sleeper used for backoff
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Model name reported in results
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or_else(|| self.llm.model())
    }

    /// One generation attempt; errors propagate.
    ///
    /// Callers wanting a reply in every case use
    /// [`generate_response_with_fallback`](Self::generate_response_with_fallback).
    pub async fn generate(
        &self,
        issue: &str,
        context: &[RetrievedMatch],
        tone: &str,
    ) -> Result<GenerationResult> {
        if issue.trim().is_empty() {
            return Err(Error::invalid("Customer issue cannot be empty"));
        }

        let mut request = CompletionRequest::new(
            SYSTEM_PROMPT,
            PromptBuilder::build_user_prompt(issue, context, tone),
            self.temperature,
            self.max_tokens,
        )
        .with_penalties(self.presence_penalty, self.frequency_penalty);
        if let Some(model) = &self.model {
            request = request.with_model(model.as_str());
        }

        tracing::info!(
            "Generating response for issue: '{}...' with {} context chunks",
            preview(issue, 100),
            context.len()
        );
        let response_text = self.llm.complete(&request).await?;
        tracing::info!(
            "Successfully generated response using {} context chunks",
            context.len()
        );

        Ok(GenerationResult {
            response_text,
            sources: PromptBuilder::sources(context),
            context_used: context.len(),
            model_used: self.model_name().to_string(),
        })
    }

    /// Generate with retries; never fails.
    ///
    /// Rate limits back off exponentially, connection failures wait a fixed
    /// delay and any other error stops at once. When nothing succeeds the
    /// fallback apology is returned with the last error as its cause.
    pub async fn generate_response_with_fallback(
        &self,
        issue: &str,
        context: &[RetrievedMatch],
        tone: &str,
    ) -> GenerationResult {
        tracing::info!(
            "Attempting response generation with fallback for: '{}...'",
            preview(issue, 50)
        );

        let outcome = self
            .policy
            .run(self.sleeper.as_ref(), move |_| self.generate(issue, context, tone))
            .await;

        match outcome {
            Ok(result) => result,
            Err(e) => {
                let cause = match e {
                    Error::Exhausted { last_error, .. } => last_error,
                    other => other.to_string(),
                };
                tracing::error!(
                    "All generation attempts failed, using fallback response. Last error: {}",
                    cause
                );
                GenerationResult::fallback(&cause)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::fakes::ScriptedLlm;
    use crate::providers::RecordingSleeper;
    use std::time::Duration;

    fn context() -> Vec<RetrievedMatch> {
        vec![
            RetrievedMatch {
                text: "[Login Issues] Reset your password from the sign-in page.".to_string(),
                score: 0.91,
                sequence_index: 0,
                source: "kb.txt".to_string(),
            },
            RetrievedMatch {
                text: "Reset emails arrive within five minutes.".to_string(),
                score: 0.67,
                sequence_index: 3,
                source: "kb.txt".to_string(),
            },
        ]
    }

    fn generator(llm: Arc<ScriptedLlm>, sleeper: Arc<RecordingSleeper>) -> ResponseGenerator {
        ResponseGenerator::from_config(llm, &OpenAiConfig::default(), &GenerationConfig::default())
            .with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn test_generate_builds_grounded_result() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("Thanks for reaching out...".to_string())]));
        let result = generator(llm.clone(), Arc::new(RecordingSleeper::new()))
            .generate("I can't log in", &context(), "empathetic")
            .await
            .unwrap();

        assert_eq!(result.response_text, "Thanks for reaching out...");
        assert_eq!(result.context_used, 2);
        assert_eq!(result.model_used, "gpt-4");
        assert_eq!(
            result.sources,
            vec![
                "Knowledge base chunk 0 (score: 0.91)".to_string(),
                "Knowledge base chunk 3 (score: 0.67)".to_string()
            ]
        );

        let request = llm.requests().remove(0);
        assert_eq!(request.model.as_deref(), Some("gpt-4"));
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.presence_penalty, Some(0.1));
        assert_eq!(request.frequency_penalty, Some(0.1));
        assert!(request.user.contains("TONE REQUIREMENT: empathetic"));
        assert_eq!(request.system, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_recovers_after_one_failure() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(Error::RateLimited("429 Too Many Requests".to_string())),
            Ok("Here is how to reset your password.".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let result = generator(llm.clone(), sleeper.clone())
            .generate_response_with_fallback("I can't log in", &context(), "empathetic")
            .await;

        assert!(!result.is_fallback());
        assert_eq!(result.response_text, "Here is how to reset your password.");
        assert_eq!(llm.requests().len(), 2);
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_falls_back() {
        let llm = Arc::new(ScriptedLlm::always_failing(|| {
            Error::RateLimited("quota exceeded".to_string())
        }));
        let sleeper = Arc::new(RecordingSleeper::new());
        let result = generator(llm.clone(), sleeper.clone())
            .generate_response_with_fallback("Refund please", &context(), "formal")
            .await;

        assert!(result.is_fallback());
        assert_eq!(result.model_used, "fallback");
        assert!(result.sources.is_empty());
        assert_eq!(result.context_used, 0);
        assert!(result.response_text.starts_with("I apologize"));
        assert!(result.response_text.ends_with("Error: Rate limit exceeded: quota exceeded"));
        assert_eq!(llm.requests().len(), 2);
        // No wait after the final attempt
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_connection_errors_use_fixed_delay() {
        let llm = Arc::new(ScriptedLlm::always_failing(|| {
            Error::Unavailable("connection refused".to_string())
        }));
        let sleeper = Arc::new(RecordingSleeper::new());
        let generator = ResponseGenerator::new(llm.clone())
            .with_sleeper(sleeper.clone())
            .with_policy(RetryPolicy {
                max_attempts: 3,
                connection_delay: Duration::from_millis(250),
            });

        let result = generator
            .generate_response_with_fallback("Site is down", &[], "urgent")
            .await;

        assert!(result.is_fallback());
        assert_eq!(llm.requests().len(), 3);
        assert_eq!(sleeper.waits(), vec![Duration::from_millis(250); 2]);
        assert_eq!(result.model_used, "fallback");
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let llm = Arc::new(ScriptedLlm::always_failing(|| Error::llm("model not found")));
        let sleeper = Arc::new(RecordingSleeper::new());
        let result = generator(llm.clone(), sleeper.clone())
            .generate_response_with_fallback("Help", &context(), "friendly")
            .await;

        assert!(result.is_fallback());
        assert!(result.response_text.contains("model not found"));
        assert_eq!(llm.requests().len(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_blank_issue_is_invalid() {
        let llm = Arc::new(ScriptedLlm::new(Vec::new()));
        let generator = ResponseGenerator::new(llm.clone());

        assert!(matches!(
            generator.generate("  ", &[], "calm").await,
            Err(Error::Invalid(_))
        ));
        let result = generator.generate_response_with_fallback("", &[], "calm").await;
        assert!(result.is_fallback());
        assert!(llm.requests().is_empty());
        assert_eq!(generator.model_name(), "scripted-model");
    }
}
