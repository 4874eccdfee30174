//! Session history and statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::providers::IndexStats;
use crate::server::state::AppState;
use crate::session::{HistoryEntry, SessionStats};

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub session: SessionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_error: Option<String>,
}

/// GET /api/history - Drafts of this session, newest first
pub async fn list_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        entries: state.history().entries(),
    })
}

/// DELETE /api/history - Forget drafted entries
pub async fn clear_history(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.history().clear();
    tracing::info!("Cleared {} history entries", removed);
    Json(ClearResponse { removed })
}

/// GET /api/stats - Session counters and vector index statistics
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let (index, index_error) = match state.pipeline().stats().await {
        Ok(stats) => (Some(stats), None),
        Err(e) => {
            tracing::warn!("Failed to read index stats: {}", e);
            (None, Some(e.to_string()))
        }
    };

    Json(StatsResponse {
        session: state.history().stats(),
        index,
        index_error,
    })
}
