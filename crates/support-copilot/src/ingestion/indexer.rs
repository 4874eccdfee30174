//! Knowledge base indexing: chunk, embed and upsert in paced batches

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ChunkingConfig, IndexingConfig};
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, Sleeper, TokioSleeper, VectorIndexProvider};
use crate::types::{Chunk, IndexRecord};

use super::chunker::TextChunker;

/// Summary of one indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexingReport {
    /// Source file name
    pub source: String,
    /// Chunks produced by the chunker
    pub chunks: usize,
    /// Records the index accepted
    pub stored: usize,
    /// Batches issued
    pub batches: usize,
    /// Batches that failed as a whole and were retried per record
    pub failed_batches: usize,
    /// Records that failed even individually
    pub dropped: usize,
}

/// Outcome of the batched upsert stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub stored: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub dropped: usize,
}

/// Orchestrates chunker, embedding provider and vector index
pub struct KnowledgeIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    chunker: TextChunker,
    batch_size: usize,
    batch_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl KnowledgeIndexer {
    /// Create an indexer with 100-record batches and a 100ms pause between them
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            embedder,
            index,
            chunker,
            batch_size: 100,
            batch_delay: Duration::from_millis(100),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Create an indexer from configuration
    pub fn from_config(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        chunking: &ChunkingConfig,
        indexing: &IndexingConfig,
    ) -> Self {
        let chunker = TextChunker::new(chunking.target_size).with_min_len(chunking.min_chunk_len);
        Self::new(embedder, index, chunker).with_batching(
            indexing.batch_size,
            Duration::from_millis(indexing.batch_delay_ms),
        )
    }

    /// Override batch size and inter-batch delay
    pub fn with_batching(mut self, batch_size: usize, batch_delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }

    /// Replace the sleeper used for batch pacing
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Index a UTF-8 text file, returning the number of stored records
    pub async fn index_documents(&self, path: impl AsRef<Path>) -> Result<usize> {
        Ok(self.index_file(path).await?.stored)
    }

    /// Index a UTF-8 text file, returning the full report
    pub async fn index_file(&self, path: impl AsRef<Path>) -> Result<IndexingReport> {
        let path = path.as_ref();
        if !path.exists() {
            let message = format!("Knowledge base file not found: {}", path.display());
            tracing::error!("{}", message);
            return Err(Error::NotFound(message));
        }

        let content = tokio::fs::read_to_string(path).await?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.index_text(&content, &source).await
    }

    /// Index in-memory text under the given source name
    pub async fn index_text(&self, content: &str, source: &str) -> Result<IndexingReport> {
        if content.trim().is_empty() {
            tracing::error!("Knowledge base file is empty: {}", source);
            return Err(Error::EmptySource(source.to_string()));
        }

        let chunks = self.chunker.chunk(content);
        if chunks.is_empty() {
            tracing::error!("No valid chunks created from {}", source);
            return Err(Error::NoChunks(source.to_string()));
        }
        tracing::info!("Created {} chunks from knowledge base", chunks.len());

        // One stamp per run: ids are unique within the run, not across runs
        let run_stamp = chrono::Utc::now().timestamp_millis();
        let chunk_count = chunks.len();

        let mut records = Vec::with_capacity(chunk_count);
        for (i, text) in chunks.into_iter().enumerate() {
            let vector = self.embedder.embed(&text).await.map_err(|e| {
                tracing::error!("Document indexing failed at chunk {}: {}", i, e);
                e
            })?;
            let chunk = Chunk::new(text, source, i as u32, run_stamp);
            records.push(chunk.embedded(vector).into_record());
        }

        let summary = self.store_records(&records).await;
        tracing::info!(
            "Successfully uploaded {}/{} vectors",
            summary.stored,
            records.len()
        );

        Ok(IndexingReport {
            source: source.to_string(),
            chunks: chunk_count,
            stored: summary.stored,
            batches: summary.batches,
            failed_batches: summary.failed_batches,
            dropped: summary.dropped,
        })
    }

    /// Upsert records in sequential batches.
    ///
    /// A failed batch is retried one record at a time; records that still fail
    /// are dropped and the run continues.
    pub async fn store_records(&self, records: &[IndexRecord]) -> UpsertSummary {
        let total_batches = records.len().div_ceil(self.batch_size);
        let mut summary = UpsertSummary {
            batches: total_batches,
            ..UpsertSummary::default()
        };

        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            match self.index.upsert(batch).await {
                Ok(()) => {
                    summary.stored += batch.len();
                    tracing::info!("Uploaded batch {}/{}", i + 1, total_batches);
                }
                Err(e) => {
                    summary.failed_batches += 1;
                    tracing::warn!("Failed to upload batch {}/{}: {}", i + 1, total_batches, e);

                    for record in batch {
                        match self.index.upsert(std::slice::from_ref(record)).await {
                            Ok(()) => summary.stored += 1,
                            Err(e) => {
                                summary.dropped += 1;
                                tracing::debug!("Dropped record {}: {}", record.id, e);
                            }
                        }
                    }
                }
            }

            if i + 1 < total_batches {
                self.sleeper.sleep(self.batch_delay).await;
            }
        }

        summary
    }
}
