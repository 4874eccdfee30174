//! Vector index provider trait for storing and querying embeddings

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::types::{IndexRecord, RecordMetadata};

/// A nearest-neighbour hit
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    /// Record id
    pub id: String,
    /// Similarity score (higher is more similar)
    pub score: f32,
    /// Stored metadata, `None` when the record carries none
    pub metadata: Option<RecordMetadata>,
}

/// Index-level statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
    /// Number of stored vectors
    pub total_vector_count: u64,
    /// Vector dimensionality, when known
    pub dimension: Option<usize>,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `PineconeIndex`: hosted Pinecone index (cosine metric)
/// - `InMemoryVectorIndex`: process-local index
///
/// The index must already exist; providers connect and validate but never
/// provision.
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    /// Insert or replace records in one request
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()>;

    /// Return up to `top_k` records ordered by descending score
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>>;

    /// Get index statistics
    async fn stats(&self) -> Result<IndexStats>;

    /// Get provider name for logging
    fn name(&self) -> &'static str;
}
