//! Injectable waiting
//!
//! Batch pacing and retry backoff sleep through [`Sleeper`] so tests can
//! observe the schedule without real waiting.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every wait requested so far, in order
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }

    /// Sum of requested waits
    pub fn total(&self) -> Duration {
        self.waits.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}
