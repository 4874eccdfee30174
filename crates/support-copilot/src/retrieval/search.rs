//! Threshold-filtered semantic search over the knowledge base

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::logging::preview;
use crate::providers::{EmbeddingProvider, VectorIndexProvider};
use crate::types::{Outcome, RetrievedMatch};

/// Default minimum similarity; matches must score strictly above it
pub const RELEVANCE_THRESHOLD: f32 = 0.5;

/// Semantic retriever
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    threshold: f32,
    default_top_k: usize,
}

impl Retriever {
    /// Create a retriever with the default threshold and `top_k = 3`
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndexProvider>) -> Self {
        Self {
            embedder,
            index,
            threshold: RELEVANCE_THRESHOLD,
            default_top_k: 3,
        }
    }

    pub fn from_config(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            threshold: config.relevance_threshold,
            default_top_k: config.top_k,
            ..Self::new(embedder, index)
        }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Search, reporting failures as `Outcome::Degraded`.
    ///
    /// Blank queries return no matches without calling the embedder.
    pub async fn search_outcome(&self, query: &str, top_k: usize) -> Outcome<Vec<RetrievedMatch>> {
        if query.trim().is_empty() {
            tracing::warn!("Empty query provided to search");
            return Outcome::Ok(Vec::new());
        }
        if top_k == 0 {
            return Outcome::Ok(Vec::new());
        }

        match self.try_search(query, top_k).await {
            Ok(matches) => Outcome::Ok(matches),
            Err(e) => Outcome::Degraded(format!("Search failed: {}", e)),
        }
    }

    /// Search, collapsing any failure to an empty list
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedMatch> {
        let outcome = self.search_outcome(query, top_k).await;
        if let Some(reason) = outcome.reason() {
            tracing::warn!("{}", reason);
        }
        outcome.value_or_default()
    }

    async fn try_search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedMatch>> {
        tracing::debug!("Searching for: '{}'", preview(query, 50));

        let vector = self.embedder.embed(query).await?;
        let hits = self.index.query(&vector, top_k).await?;
        let total = hits.len();

        let mut matches: Vec<RetrievedMatch> = hits
            .into_iter()
            .filter(|hit| hit.score > self.threshold)
            .filter_map(|hit| {
                let metadata = hit.metadata?;
                Some(RetrievedMatch {
                    text: metadata.text,
                    score: hit.score,
                    sequence_index: metadata.sequence_index,
                    source: metadata.source,
                })
            })
            .collect();
        matches.truncate(top_k);

        tracing::info!(
            "{} hits, {} above threshold {}",
            total,
            matches.len(),
            self.threshold
        );
        Ok(matches)
    }
}
