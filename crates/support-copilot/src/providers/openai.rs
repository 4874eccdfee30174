//! OpenAI client for embeddings and chat completions

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::error::{Error, Result};

use super::embedding::{prepare_text, EmbeddingProvider};
use super::llm::{CompletionRequest, LlmProvider};

/// OpenAI API client, shared by the embedding and LLM roles
pub struct OpenAiClient {
    /// HTTP client with auth headers installed
    client: Client,
    /// API base URL without trailing slash
    base_url: String,
    /// Embedding model name
    embedding_model: String,
    /// Embedding dimensions
    dimensions: usize,
    /// Default chat model
    chat_model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Which call failed, for error wording
#[derive(Clone, Copy)]
enum Call {
    Embedding,
    Chat,
}

impl Call {
    fn failure(self, message: String) -> Error {
        match self {
            Call::Embedding => Error::Embedding(message),
            Call::Chat => Error::Llm(message),
        }
    }
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("missing OpenAI API key".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| Error::Config("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build OpenAI HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            embedding_model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            chat_model: config.generation_model.clone(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B, call: Call) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, call))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(status_error(status, &body, call));
        }

        response
            .json()
            .await
            .map_err(|e| call.failure(format!("failed to parse OpenAI response: {}", e)))
    }
}

/// Map a non-success status to the error taxonomy.
///
/// Only 429 is retry-eligible; server errors fail the call like any other status.
fn status_error(status: StatusCode, body: &str, call: Call) -> Error {
    let message = format!("OpenAI request failed ({}): {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        Error::RateLimited(message)
    } else {
        call.failure(message)
    }
}

/// Map a transport failure; connection problems are retry-eligible
fn transport_error(err: reqwest::Error, call: Call) -> Error {
    if err.is_connect() || err.is_timeout() {
        Error::Unavailable(format!("OpenAI connection error: {}", err))
    } else {
        call.failure(format!("OpenAI request failed: {}", err))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let clean = prepare_text(text);
        if clean.is_empty() {
            return Err(Error::invalid("Text cannot be empty"));
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: [clean.as_str()],
        };
        let response: EmbeddingResponse = self.post("embeddings", &request, Call::Embedding).await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::embedding("OpenAI returned no embedding"))?;

        if embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let model = request.model.as_deref().unwrap_or(&self.chat_model);
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            presence_penalty: request.presence_penalty,
            frequency_penalty: request.frequency_penalty,
        };

        tracing::debug!("Chat completion with model {}", model);
        let response: ChatResponse = self.post("chat/completions", &body, Call::Chat).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::llm("No text in OpenAI response"))
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.chat_model
    }
}
