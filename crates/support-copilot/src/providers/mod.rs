//! Provider abstractions for embeddings, chat completions and vector storage
//!
//! Trait-based seams let the pipeline run against OpenAI + Pinecone in
//! production and against fakes or the in-memory index in tests.

pub mod clock;
pub mod embedding;
pub mod llm;
pub mod memory;
pub mod openai;
pub mod pinecone;
pub mod vector_index;

pub use clock::{RecordingSleeper, Sleeper, TokioSleeper};
pub use embedding::EmbeddingProvider;
pub use llm::{CompletionRequest, LlmProvider};
pub use memory::InMemoryVectorIndex;
pub use openai::OpenAiClient;
pub use pinecone::PineconeIndex;
pub use vector_index::{IndexMatch, IndexStats, VectorIndexProvider};
