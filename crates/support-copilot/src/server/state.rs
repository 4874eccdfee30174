//! Application state for the copilot server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::CopilotConfig;
use crate::error::Result;
use crate::pipeline::CopilotPipeline;
use crate::session::SessionHistory;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: CopilotConfig,
    /// Drafting pipeline
    pipeline: CopilotPipeline,
    /// Draft history for this process
    history: SessionHistory,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state around an assembled pipeline
    pub fn new(config: CopilotConfig, pipeline: CopilotPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                history: SessionHistory::default(),
                ready: RwLock::new(false),
            }),
        }
    }

    /// Build production providers and connect to the vector index
    pub async fn connect(config: CopilotConfig) -> Result<Self> {
        tracing::info!(
            "Initializing copilot state (vector index: {:?})...",
            config.vector_index.backend
        );
        let pipeline = CopilotPipeline::connect(&config).await?;
        tracing::info!("Support copilot initialized successfully");
        Ok(Self::new(config, pipeline))
    }

    pub fn config(&self) -> &CopilotConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &CopilotPipeline {
        &self.inner.pipeline
    }

    pub fn history(&self) -> &SessionHistory {
        &self.inner.history
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
