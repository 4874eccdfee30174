//! Reply drafting and tone detection

mod generator;
pub mod prompt;
pub mod retry;
mod tone;

pub use generator::ResponseGenerator;
pub use prompt::PromptBuilder;
pub use retry::{RetryPolicy, RetryState};
pub use tone::ToneClassifier;

#[cfg(test)]
pub(crate) mod fakes {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    use crate::error::{Error, Result};
    use crate::providers::{CompletionRequest, LlmProvider};

    /// LLM that replays scripted answers and records requests
    pub struct ScriptedLlm {
        script: Mutex<VecDeque<Result<String>>>,
        when_empty: Option<fn() -> Error>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub fn new(script: Vec<Result<String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                when_empty: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Fails every call with a fresh error
        pub fn always_failing(make: fn() -> Error) -> Self {
            Self {
                when_empty: Some(make),
                ..Self::new(Vec::new())
            }
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().push(request.clone());
            match self.script.lock().pop_front() {
                Some(answer) => answer,
                None => Err(self
                    .when_empty
                    .map(|make| make())
                    .unwrap_or_else(|| Error::llm("script exhausted"))),
            }
        }


        fn name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }
}
