//! Core types for the support copilot

pub mod chunk;
pub mod outcome;
pub mod response;
pub mod tone;

pub use chunk::{Chunk, EmbeddedChunk, IndexRecord, RecordMetadata};
pub use outcome::Outcome;
pub use response::{GenerationResult, RetrievedMatch, FALLBACK_MODEL};
pub use tone::{ResponseTone, Tone};
