//! Retrieval and generation result types

use serde::{Deserialize, Serialize};

/// Model marker used when every generation attempt failed
pub const FALLBACK_MODEL: &str = "fallback";

/// A knowledge base passage that cleared the relevance threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMatch {
    /// Passage text
    pub text: String,
    /// Cosine similarity (0.0-1.0)
    pub score: f32,
    /// Position of the chunk within its source
    pub sequence_index: u32,
    /// Source file name
    pub source: String,
}

impl RetrievedMatch {
    /// Human-readable attribution used in generation results
    pub fn source_label(&self) -> String {
        format!(
            "Knowledge base chunk {} (score: {:.2})",
            self.sequence_index, self.score
        )
    }
}

/// A drafted support reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Drafted reply
    pub response_text: String,
    /// One attribution per context passage, in context order
    pub sources: Vec<String>,
    /// Number of context passages supplied to the model
    pub context_used: usize,
    /// Model name, or [`FALLBACK_MODEL`]
    pub model_used: String,
}

impl GenerationResult {
    /// The apology returned once retries are exhausted
    pub fn fallback(cause: &str) -> Self {
        Self {
            response_text: format!(
                "I apologize, but I'm experiencing technical difficulties. Please try again in a moment. \
                 For immediate assistance, you can refer to our knowledge base or contact support directly.\
                 \n\nError: {}",
                cause
            ),
            sources: Vec::new(),
            context_used: 0,
            model_used: FALLBACK_MODEL.to_string(),
        }
    }

    /// True when this is the fallback apology
    pub fn is_fallback(&self) -> bool {
        self.model_used == FALLBACK_MODEL
    }

    /// Rough word count of the reply
    pub fn word_count(&self) -> usize {
        self.response_text.split_whitespace().count()
    }
}
