//! Error types for the support copilot

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for copilot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Copilot errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source file, document or index missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Source content is blank after trimming
    #[error("Knowledge base source is empty: {0}")]
    EmptySource(String),

    /// Chunking produced nothing usable
    #[error("No valid chunks created from {0}")]
    NoChunks(String),

    /// Malformed input (empty text, bad sizes)
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Embedding provider failure
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index failure
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Language model failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Provider rejected the call with a rate limit
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Provider could not be reached
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Retry budget consumed
    #[error("Gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How the generation retry loop treats an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Wait `2^attempt` seconds, then try again
    Backoff,
    /// Wait a fixed short interval, then try again
    FixedDelay,
    /// Stop retrying
    Fatal,
}

impl Error {
    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Classify this error for the retry loop
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Error::RateLimited(_) => RetryClass::Backoff,
            Error::Unavailable(_) => RetryClass::FixedDelay,
            Error::Http(err) if err.is_connect() || err.is_timeout() => RetryClass::FixedDelay,
            _ => RetryClass::Fatal,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::EmptySource(_) => (StatusCode::BAD_REQUEST, "empty_source"),
            Error::NoChunks(_) => (StatusCode::BAD_REQUEST, "no_chunks"),
            Error::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error"),
            Error::VectorIndex(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_index_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Error::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            Error::Exhausted { .. } => (StatusCode::SERVICE_UNAVAILABLE, "retries_exhausted"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_class() {
        assert_eq!(Error::RateLimited("429".into()).retry_class(), RetryClass::Backoff);
        assert_eq!(Error::Unavailable("refused".into()).retry_class(), RetryClass::FixedDelay);
        assert_eq!(Error::llm("bad request").retry_class(), RetryClass::Fatal);
        assert_eq!(Error::invalid("empty").retry_class(), RetryClass::Fatal);
    }

    #[test]
    fn test_status_mapping() {
        let response = Error::NotFound("kb.txt".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = Error::RateLimited("slow down".into()).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = Error::NoChunks("kb.txt".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let response = Error::from(parse).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = Error::Unavailable("refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
