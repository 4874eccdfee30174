//! Knowledge base ingestion: chunking and batched indexing

mod chunker;
mod indexer;

pub use chunker::{TextChunker, MIN_CHUNK_LEN};
pub use indexer::{IndexingReport, KnowledgeIndexer, UpsertSummary};
