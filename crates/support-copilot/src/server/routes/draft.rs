//! Draft endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::{Draft, DraftRequest};
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    #[serde(flatten)]
    pub draft: Draft,
    /// History entry recorded for this draft
    pub history_id: Uuid,
}

/// POST /api/draft - Draft a grounded support reply
pub async fn draft_reply(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<DraftResponse>> {
    let draft = state.pipeline().draft(&request).await?;

    if draft.matches.is_empty() {
        tracing::info!("No specific knowledge base matches, drafting without context");
    } else {
        tracing::info!("Found {} relevant knowledge base sections", draft.matches.len());
    }

    let entry = state
        .history()
        .record(&request.issue, &draft.response_tone, &draft.result);

    Ok(Json(DraftResponse {
        draft,
        history_id: entry.id,
    }))
}
