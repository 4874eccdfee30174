//! Bounded retry with exponential backoff

use std::future::Future;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{Error, Result, RetryClass};
use crate::providers::Sleeper;

/// Retry budget and delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, including the first
    pub max_attempts: u32,
    /// Wait after a connection failure
    pub connection_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            connection_delay: Duration::from_secs(1),
        }
    }
}

/// Where the retry loop is
#[derive(Debug, Clone, PartialEq)]
pub enum RetryState {
    /// Running the zero-based attempt
    Attempting(u32),
    /// Waiting before the given attempt
    Backoff { next_attempt: u32, delay: Duration },
    /// Budget consumed
    Exhausted { attempts: u32, last_error: String },
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            connection_delay: Duration::from_millis(config.connection_retry_delay_ms),
        }
    }

    /// Delay before the next try after zero-based `attempt` failed.
    ///
    /// `None` when the error is not retryable or no attempt is left.
    /// Rate limits wait `2^attempt` seconds.
    pub fn delay_after(&self, attempt: u32, error: &Error) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        match error.retry_class() {
            RetryClass::Backoff => Some(Duration::from_secs(2u64.saturating_pow(attempt))),
            RetryClass::FixedDelay => Some(self.connection_delay),
            RetryClass::Fatal => None,
        }
    }

    /// Run `op` until it succeeds, fails fatally or the budget runs out.
    ///
    /// A fatal error is returned as is; running out of attempts yields
    /// `Error::Exhausted` carrying the last error's message.
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut state = RetryState::Attempting(0);

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    tracing::debug!("Generation attempt {}/{}", attempt + 1, max_attempts);
                    let error = match op(attempt).await {
                        Ok(value) => return Ok(value),
                        Err(e) => e,
                    };

                    match error.retry_class() {
                        RetryClass::Backoff => {
                            tracing::warn!("Rate limit hit, attempt {}: {}", attempt + 1, error)
                        }
                        RetryClass::FixedDelay => {
                            tracing::warn!("Connection error, attempt {}: {}", attempt + 1, error)
                        }
                        RetryClass::Fatal => {
                            tracing::error!("Unexpected error in attempt {}: {}", attempt + 1, error);
                            return Err(error);
                        }
                    }

                    match self.delay_after(attempt, &error) {
                        Some(delay) => RetryState::Backoff {
                            next_attempt: attempt + 1,
                            delay,
                        },
                        None => RetryState::Exhausted {
                            attempts: attempt + 1,
                            last_error: error.to_string(),
                        },
                    }
                }
                RetryState::Backoff {
                    next_attempt,
                    delay,
                } => {
                    tracing::info!("Waiting {:.1}s before retry", delay.as_secs_f64());
                    sleeper.sleep(delay).await;
                    RetryState::Attempting(next_attempt)
                }
                RetryState::Exhausted {
                    attempts,
                    last_error,
                } => return Err(Error::Exhausted { attempts, last_error }),
            };
        }
    }
}
