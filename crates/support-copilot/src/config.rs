//! Configuration for the support copilot

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main copilot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CopilotConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// OpenAI embedding and chat configuration
    pub openai: OpenAiConfig,
    /// Vector index configuration
    pub vector_index: VectorIndexConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Batched upsert configuration
    pub indexing: IndexingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Response generation configuration
    pub generation: GenerationConfig,
    /// Tone classification configuration
    pub tone: ToneConfig,
}

impl CopilotConfig {
    /// Load configuration from an optional TOML file, then overlay environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::NotFound(format!(
                        "config file {}",
                        path.display()
                    )));
                }
                let raw = std::fs::read_to_string(path)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = get("PINECONE_API_KEY") {
            self.vector_index.api_key = Some(v);
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.vector_index.index_name = Some(v);
        }
        if let Some(v) = get("PINECONE_HOST") {
            self.vector_index.host = Some(v);
        }
        if let Some(v) = get("COPILOT_KNOWLEDGE_BASE") {
            self.indexing.knowledge_base = Some(PathBuf::from(v));
        }
        if let Some(v) = get("COPILOT_HOST") {
            self.server.host = v;
        }
        if let Some(port) = get("COPILOT_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Ensure all required settings are present and in range
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.openai.api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if self.vector_index.backend == VectorBackend::Pinecone {
            if self.vector_index.api_key.is_none() {
                missing.push("PINECONE_API_KEY");
            }
            if self.vector_index.index_name.is_none() {
                missing.push("PINECONE_INDEX_NAME");
            }
        }
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            )));
        }

        if self.chunking.target_size == 0 {
            return Err(Error::Config("chunking.target_size must be positive".to_string()));
        }
        if self.indexing.batch_size == 0 {
            return Err(Error::Config("indexing.batch_size must be positive".to_string()));
        }
        if self.generation.max_attempts == 0 {
            return Err(Error::Config("generation.max_attempts must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.retrieval.relevance_threshold) {
            return Err(Error::Config(
                "retrieval.relevance_threshold must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub filter: String,
    /// Optional log file (rotated daily)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "support_copilot=info,tower_http=info".to_string(),
            file: None,
        }
    }
}

/// OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (usually from OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Embedding dimensions (1536 for text-embedding-3-small)
    pub embedding_dimensions: usize,
    /// Model used for drafting replies
    pub generation_model: String,
    /// Model used for tone classification
    pub tone_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            generation_model: "gpt-4".to_string(),
            tone_model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Vector index backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Hosted Pinecone index
    #[default]
    Pinecone,
    /// Process-local index, contents lost on restart
    Memory,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    /// Backend provider
    pub backend: VectorBackend,
    /// API key (usually from PINECONE_API_KEY)
    pub api_key: Option<String>,
    /// Name of an existing index
    pub index_name: Option<String>,
    /// Control plane URL used to resolve the index host
    pub control_plane_url: String,
    /// Data plane host, skips control plane lookup when set
    pub host: Option<String>,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Pinecone,
            api_key: None,
            index_name: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            host: None,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub target_size: usize,
    /// Chunks shorter than this are dropped as noise
    pub min_chunk_len: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: 500,
            min_chunk_len: 10,
        }
    }
}

/// Knowledge base indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Records per upsert request
    pub batch_size: usize,
    /// Pause between batches in milliseconds
    pub batch_delay_ms: u64,
    /// Knowledge base file indexed at startup
    pub knowledge_base: Option<PathBuf>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_delay_ms: 100,
            knowledge_base: None,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of matches requested from the index
    pub top_k: usize,
    /// Matches at or below this score are dropped
    pub relevance_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            relevance_threshold: 0.5,
        }
    }
}

/// Response generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token bound
    pub max_tokens: u32,
    /// Presence penalty
    pub presence_penalty: f32,
    /// Frequency penalty
    pub frequency_penalty: f32,
    /// Wait after a connection failure in milliseconds
    pub connection_retry_delay_ms: u64,
    /// Tone used when the caller does not pick one
    pub default_tone: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            temperature: 0.7,
            max_tokens: 500,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
            connection_retry_delay_ms: 1000,
            default_tone: "empathetic".to_string(),
        }
    }
}

/// Tone classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token bound
    pub max_tokens: u32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 10,
        }
    }
}
