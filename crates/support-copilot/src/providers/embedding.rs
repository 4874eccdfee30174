//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OpenAiClient`: OpenAI embeddings API (text-embedding-3-small)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    ///
    /// Fails with `Error::Invalid` when the text is blank.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimensions (1536 for text-embedding-3-small)
    fn dimensions(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &'static str;
}

/// Normalise text before embedding: newlines become spaces, ends are trimmed
pub fn prepare_text(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_text() {
        assert_eq!(prepare_text("  line one\nline two \n"), "line one line two");
        assert_eq!(prepare_text("\n\n  "), "");
    }
}
