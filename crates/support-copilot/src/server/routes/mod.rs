//! API routes for the copilot server

pub mod draft;
pub mod history;
pub mod index;
pub mod search;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::{ResponseTone, Tone};

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Knowledge base
        .route("/index", post(index::index_documents))
        .route("/search", post(search::search))
        // Drafting
        .route("/tone", post(search::detect_tone))
        .route("/draft", post(draft::draft_reply))
        // Session
        .route(
            "/history",
            get(history::list_history).delete(history::clear_history),
        )
        .route("/stats", get(history::stats))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "support-copilot",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented drafting of customer support replies",
        "pipeline": state.pipeline().info(),
        "response_tones": ResponseTone::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        "detected_tones": Tone::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
        "endpoints": {
            "POST /api/index": "Index a knowledge base file",
            "POST /api/search": "Search the knowledge base",
            "POST /api/tone": "Detect the tone of a customer message",
            "POST /api/draft": "Draft a reply for a customer issue",
            "GET /api/history": "Drafts of this session",
            "DELETE /api/history": "Clear the draft history",
            "GET /api/stats": "Session and index statistics"
        }
    }))
}
