//! Chunk and index record types

use serde::{Deserialize, Serialize};

/// A bounded span of knowledge base text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier unique within one ingestion run
    pub id: String,
    /// Chunk text
    pub text: String,
    /// Source file name
    pub source: String,
    /// Position of the chunk within its source
    pub sequence_index: u32,
}

impl Chunk {
    /// Create a chunk, deriving its id from the sequence index and run timestamp
    pub fn new(text: String, source: impl Into<String>, sequence_index: u32, run_stamp: i64) -> Self {
        Self {
            id: Self::make_id(sequence_index, run_stamp),
            text,
            source: source.into(),
            sequence_index,
        }
    }

    /// Build the record id for a chunk.
    ///
    /// Ids embed the run timestamp, so indexing the same source twice stores
    /// two copies rather than overwriting.
    pub fn make_id(sequence_index: u32, run_stamp: i64) -> String {
        format!("chunk_{}_{}", sequence_index, run_stamp)
    }

    /// Attach an embedding
    pub fn embedded(self, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk { chunk: self, vector }
    }
}

/// A chunk paired with its embedding; lives only during indexing
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    /// Convert into the persisted index shape
    pub fn into_record(self) -> IndexRecord {
        IndexRecord {
            id: self.chunk.id,
            vector: self.vector,
            metadata: RecordMetadata {
                text: self.chunk.text,
                source: self.chunk.source,
                sequence_index: self.chunk.sequence_index,
            },
        }
    }
}

/// Metadata stored alongside each vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub text: String,
    pub source: String,
    pub sequence_index: u32,
}

/// The persisted unit of the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: RecordMetadata,
}
