//! The assembled drafting pipeline
//!
//! Built once from explicit provider handles and shared by reference; there
//! is no global state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::{CopilotConfig, VectorBackend};
use crate::error::{Error, Result};
use crate::generation::{ResponseGenerator, ToneClassifier};
use crate::ingestion::{IndexingReport, KnowledgeIndexer};
use crate::providers::{
    EmbeddingProvider, IndexStats, InMemoryVectorIndex, LlmProvider, OpenAiClient, PineconeIndex,
    Sleeper, TokioSleeper, VectorIndexProvider,
};
use crate::retrieval::Retriever;
use crate::types::{GenerationResult, Outcome, RetrievedMatch, Tone};

/// Largest `top_k` a draft request may ask for
pub const MAX_TOP_K: usize = 5;

/// Provider handles the pipeline is built from
#[derive(Clone)]
pub struct PipelineDeps {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub index: Arc<dyn VectorIndexProvider>,
    pub sleeper: Arc<dyn Sleeper>,
}

/// A request to draft a reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftRequest {
    /// Customer issue text
    pub issue: String,
    /// Reply tone; the configured default when absent
    #[serde(default)]
    pub tone: Option<String>,
    /// Passages to retrieve (1..=5)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl DraftRequest {
    pub fn new(issue: impl Into<String>) -> Self {
        Self {
            issue: issue.into(),
            ..Self::default()
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// A drafted reply with what went into it
#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub result: GenerationResult,
    /// Tone detected in the customer's message
    pub detected_tone: Tone,
    /// Tone the reply was written in
    pub response_tone: String,
    /// Context passages used, best first
    pub matches: Vec<RetrievedMatch>,
    /// Reasons best-effort stages fell back
    pub degraded: Vec<String>,
}

/// Static description of the running pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineInfo {
    pub embedding_provider: String,
    pub embedding_dimensions: usize,
    pub vector_index: String,
    pub llm_provider: String,
    pub generation_model: String,
    pub default_top_k: usize,
    pub relevance_threshold: f32,
    pub default_tone: String,
}

/// Indexer, retriever, classifier and generator over shared providers
pub struct CopilotPipeline {
    indexer: KnowledgeIndexer,
    retriever: Retriever,
    classifier: ToneClassifier,
    generator: ResponseGenerator,
    index: Arc<dyn VectorIndexProvider>,
    info: PipelineInfo,
}

impl CopilotPipeline {
    /// Assemble the pipeline from configuration and provider handles
    pub fn new(config: &CopilotConfig, deps: PipelineDeps) -> Self {
        let indexer = KnowledgeIndexer::from_config(
            Arc::clone(&deps.embedder),
            Arc::clone(&deps.index),
            &config.chunking,
            &config.indexing,
        )
        .with_sleeper(Arc::clone(&deps.sleeper));

        let retriever = Retriever::from_config(
            Arc::clone(&deps.embedder),
            Arc::clone(&deps.index),
            &config.retrieval,
        );

        let classifier = ToneClassifier::from_config(Arc::clone(&deps.llm), &config.openai, &config.tone);

        let generator =
            ResponseGenerator::from_config(Arc::clone(&deps.llm), &config.openai, &config.generation)
                .with_sleeper(Arc::clone(&deps.sleeper));

        let info = PipelineInfo {
            embedding_provider: deps.embedder.name().to_string(),
            embedding_dimensions: deps.embedder.dimensions(),
            vector_index: deps.index.name().to_string(),
            llm_provider: deps.llm.name().to_string(),
            generation_model: generator.model_name().to_string(),
            default_top_k: retriever.default_top_k(),
            relevance_threshold: retriever.threshold(),
            default_tone: config.generation.default_tone.clone(),
        };

        Self {
            indexer,
            retriever,
            classifier,
            generator,
            index: deps.index,
            info,
        }
    }

    /// Build production providers from configuration and connect to the index
    pub async fn connect(config: &CopilotConfig) -> Result<Self> {
        let openai = Arc::new(OpenAiClient::new(&config.openai)?);
        tracing::info!(
            "OpenAI client initialized (embeddings: {}, generation: {})",
            config.openai.embedding_model,
            config.openai.generation_model
        );

        let dimensions = config.openai.embedding_dimensions;
        let index: Arc<dyn VectorIndexProvider> = match config.vector_index.backend {
            VectorBackend::Pinecone => {
                Arc::new(PineconeIndex::connect(&config.vector_index, dimensions).await?)
            }
            VectorBackend::Memory => {
                tracing::warn!("Using in-memory vector index; contents are lost on restart");
                Arc::new(InMemoryVectorIndex::new(dimensions))
            }
        };

        let deps = PipelineDeps {
            embedder: openai.clone(),
            llm: openai,
            index,
            sleeper: Arc::new(TokioSleeper),
        };
        Ok(Self::new(config, deps))
    }

    /// Index a knowledge base file
    pub async fn index_documents(&self, path: impl AsRef<Path>) -> Result<IndexingReport> {
        self.indexer.index_file(path).await
    }

    /// Retrieve passages relevant to `query`
    pub async fn search(&self, query: &str, top_k: usize) -> Outcome<Vec<RetrievedMatch>> {
        self.retriever.search_outcome(query, top_k).await
    }

    /// Detect the tone of a customer message
    pub async fn classify(&self, message: &str) -> Outcome<Tone> {
        self.classifier.classify_outcome(message).await
    }

    /// Generate a reply from explicit context; never fails
    pub async fn generate(&self, issue: &str, context: &[RetrievedMatch], tone: &str) -> GenerationResult {
        self.generator
            .generate_response_with_fallback(issue, context, tone)
            .await
    }

    /// Classify, retrieve and generate.
    ///
    /// Only request validation can fail; classification and retrieval fall
    /// back to neutral and no context, generation to the fallback reply.
    pub async fn draft(&self, request: &DraftRequest) -> Result<Draft> {
        let issue = request.issue.trim();
        if issue.is_empty() {
            return Err(Error::invalid(
                "Please enter a customer issue to generate a response.",
            ));
        }

        let top_k = request.top_k.unwrap_or_else(|| self.retriever.default_top_k());
        if !(1..=MAX_TOP_K).contains(&top_k) {
            return Err(Error::invalid(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_TOP_K, top_k
            )));
        }

        let response_tone = request
            .tone
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.info.default_tone)
            .to_string();

        let mut degraded = Vec::new();

        let detected = self.classifier.classify_outcome(issue).await;
        if let Some(reason) = detected.reason() {
            tracing::warn!("{}, using neutral", reason);
            degraded.push(reason.to_string());
        }
        let detected_tone = detected.value_or_default();

        let matches = self.retriever.search_outcome(issue, top_k).await;
        if let Some(reason) = matches.reason() {
            tracing::warn!("{}", reason);
            degraded.push(reason.to_string());
        }
        let matches = matches.value_or_default();

        let result = self
            .generator
            .generate_response_with_fallback(issue, &matches, &response_tone)
            .await;

        Ok(Draft {
            result,
            detected_tone,
            response_tone,
            matches,
            degraded,
        })
    }

    /// Vector index statistics
    pub async fn stats(&self) -> Result<IndexStats> {
        self.index.stats().await
    }

    pub fn info(&self) -> &PipelineInfo {
        &self.info
    }
}
