//! Retrieval and tone endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::MAX_TOP_K;
use crate::server::state::AppState;
use crate::types::{RetrievedMatch, Tone};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub matches: Vec<RetrievedMatch>,
    /// Why retrieval fell back to no matches, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToneRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ToneResponse {
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

/// POST /api/search - Find knowledge base passages above the relevance threshold
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let top_k = request
        .top_k
        .unwrap_or_else(|| state.config().retrieval.top_k);
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(Error::invalid(format!(
            "top_k must be between 1 and {}, got {}",
            MAX_TOP_K, top_k
        )));
    }

    let outcome = state.pipeline().search(&request.query, top_k).await;
    let degraded = outcome.reason().map(str::to_string);

    Ok(Json(SearchResponse {
        matches: outcome.value_or_default(),
        degraded,
    }))
}

/// POST /api/tone - Detect the tone of a customer message
pub async fn detect_tone(
    State(state): State<AppState>,
    Json(request): Json<ToneRequest>,
) -> Json<ToneResponse> {
    let outcome = state.pipeline().classify(&request.message).await;
    let degraded = outcome.reason().map(str::to_string);

    Json(ToneResponse {
        tone: outcome.value_or_default(),
        degraded,
    })
}
