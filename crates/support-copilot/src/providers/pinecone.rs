//! Pinecone vector index provider
//!
//! Connects to an existing serverless index. Provisioning is done out of band;
//! this client only resolves, validates and uses the index.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::VectorIndexConfig;
use crate::error::{Error, Result};
use crate::types::{IndexRecord, RecordMetadata};

use super::vector_index::{IndexMatch, IndexStats, VectorIndexProvider};

const API_VERSION: &str = "2024-07";

/// Pinecone index client
pub struct PineconeIndex {
    client: Client,
    /// Data plane base URL, e.g. `https://support-kb-abc123.svc.us-east-1.pinecone.io`
    host: String,
    index_name: String,
}

#[derive(Deserialize)]
struct IndexDescription {
    dimension: usize,
    metric: String,
    host: String,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Deserialize)]
struct IndexStatus {
    ready: bool,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: u64,
}

impl PineconeIndex {
    /// Resolve and validate an existing index.
    ///
    /// Fails with `Error::NotFound` when the index does not exist and with
    /// `Error::Config` when its metric or dimension does not match.
    pub async fn connect(config: &VectorIndexConfig, expected_dimension: usize) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("missing Pinecone API key".to_string()))?;
        let index_name = config
            .index_name
            .clone()
            .ok_or_else(|| Error::Config("missing Pinecone index name".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key)
                .map_err(|_| Error::Config("invalid Pinecone API key".to_string()))?,
        );
        headers.insert("X-Pinecone-API-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build Pinecone HTTP client: {}", e)))?;

        let host = match &config.host {
            Some(host) => normalize_host(host),
            None => {
                let description =
                    Self::describe(&client, &config.control_plane_url, &index_name).await?;
                validate_description(&description, expected_dimension)?;
                normalize_host(&description.host)
            }
        };

        let index = Self {
            client,
            host,
            index_name,
        };

        let stats = index.stats().await.map_err(|e| {
            tracing::error!("Pinecone initialization failed: {}", e);
            e
        })?;
        if let Some(dimension) = stats.dimension {
            if dimension != expected_dimension {
                return Err(Error::Config(format!(
                    "Index '{}' has dimension {}, embedder produces {}",
                    index.index_name, dimension, expected_dimension
                )));
            }
        }

        tracing::info!("Connected to Pinecone index: {}", index.index_name);
        tracing::info!("Index stats: {} vectors", stats.total_vector_count);

        Ok(index)
    }

    async fn describe(client: &Client, control_plane: &str, index_name: &str) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", control_plane.trim_end_matches('/'), index_name);
        let response = client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let message = format!("Index '{}' not found. Please create it first.", index_name);
            tracing::error!("{}", message);
            return Err(Error::NotFound(message));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::vector_index(format!("Failed to parse index description: {}", e)))
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::vector_index(format!("Failed to parse Pinecone response: {}", e)))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn validate_description(description: &IndexDescription, expected_dimension: usize) -> Result<()> {
    if !description.metric.eq_ignore_ascii_case("cosine") {
        return Err(Error::Config(format!(
            "Index metric is '{}', expected 'cosine'",
            description.metric
        )));
    }
    if description.dimension != expected_dimension {
        return Err(Error::Config(format!(
            "Index dimension is {}, embedder produces {}",
            description.dimension, expected_dimension
        )));
    }
    if let Some(status) = &description.status {
        if !status.ready {
            return Err(Error::Unavailable(format!(
                "Index is not ready (state: {})",
                status.state.as_deref().unwrap_or("unknown")
            )));
        }
    }
    Ok(())
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let message = format!("Pinecone request failed ({}): {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        Error::RateLimited(message)
    } else if status == StatusCode::NOT_FOUND {
        Error::NotFound(message)
    } else if status.is_server_error() {
        Error::Unavailable(message)
    } else {
        Error::VectorIndex(message)
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_connect() || err.is_timeout() {
        Error::Unavailable(format!("Pinecone connection error: {}", err))
    } else {
        Error::vector_index(format!("Pinecone request failed: {}", err))
    }
}

/// Convert Pinecone metadata back to record metadata.
///
/// Older records store the position under `chunk_id`; both keys are accepted.
fn metadata_from_value(metadata: &HashMap<String, serde_json::Value>) -> Option<RecordMetadata> {
    let text = metadata.get("text").and_then(|v| v.as_str())?.to_string();

    let source = metadata
        .get("source")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    // Pinecone returns numeric metadata as floats
    let sequence_index = metadata
        .get("sequence_index")
        .or_else(|| metadata.get("chunk_id"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0) as u32;

    Some(RecordMetadata {
        text,
        source,
        sequence_index,
    })
}

#[async_trait]
impl VectorIndexProvider for PineconeIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|r| PineconeVector {
                    id: &r.id,
                    values: &r.vector,
                    metadata: &r.metadata,
                })
                .collect(),
        };

        let _: serde_json::Value = self.post("vectors/upsert", &request).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response: QueryResponse = self.post("query", &request).await?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| IndexMatch {
                metadata: m.metadata.as_ref().and_then(metadata_from_value),
                id: m.id,
                score: m.score,
            })
            .collect())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response: StatsResponse = self
            .post("describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(IndexStats {
            total_vector_count: response.total_vector_count,
            dimension: response.dimension,
        })
    }

    fn name(&self) -> &'static str {
        "pinecone"
    }
}
