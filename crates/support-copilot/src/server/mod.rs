//! HTTP server for the support copilot

pub mod routes;
pub mod state;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::{Error, Result};
use state::AppState;

/// Build the router with all routes
pub fn router(state: AppState) -> Router {
    let enable_cors = state.config().server.enable_cors;

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .nest("/api", routes::api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Copilot HTTP server
pub struct CopilotServer {
    state: AppState,
}

impl CopilotServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = router(self.state.clone());

        tracing::info!("Starting support copilot on http://{}", addr);
        tracing::info!("API info: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CopilotConfig;
    use crate::generation::fakes::ScriptedLlm;
    use crate::pipeline::{CopilotPipeline, PipelineDeps};
    use crate::providers::embedding::MockEmbeddingProvider;
    use crate::providers::{InMemoryVectorIndex, RecordingSleeper};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(answers: Vec<crate::error::Result<String>>) -> AppState {
        state_with(CopilotConfig::default(), answers)
    }

    fn state_with(config: CopilotConfig, answers: Vec<crate::error::Result<String>>) -> AppState {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.0, 1.0]));
        embedder.expect_dimensions().return_const(2usize);
        embedder.expect_name().return_const("mock");

        let deps = PipelineDeps {
            embedder: Arc::new(embedder),
            llm: Arc::new(ScriptedLlm::new(answers)),
            index: Arc::new(InMemoryVectorIndex::new(2)),
            sleeper: Arc::new(RecordingSleeper::new()),
        };
        let pipeline = CopilotPipeline::new(&config, deps);
        AppState::new(config, pipeline)
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let state = state(Vec::new());
        let app = router(state.clone());

        let (status, _) = call(app.clone(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(app.clone(), Request::get("/ready").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        state.set_ready(true);
        let (status, _) = call(app, Request::get("/ready").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_draft_records_history() {
        let state = state(vec![
            Ok("urgent".to_string()),
            Ok("We are on it right away.".to_string()),
        ]);
        let app = router(state.clone());

        let (status, body) = call(
            app.clone(),
            post_json(
                "/api/draft",
                serde_json::json!({ "issue": "Checkout is broken!", "tone": "formal" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detected_tone"], "urgent");
        assert_eq!(body["response_tone"], "formal");
        assert_eq!(body["result"]["response_text"], "We are on it right away.");

        let (_, body) = call(app.clone(), Request::get("/api/history").body(Body::empty()).unwrap()).await;
        assert_eq!(body["entries"][0]["issue_preview"], "Checkout is broken!");

        let (_, body) = call(app, Request::get("/api/stats").body(Body::empty()).unwrap()).await;
        assert_eq!(body["session"]["drafts"], 1);
        assert_eq!(body["index"]["total_vector_count"], 0);
    }

    #[tokio::test]
    async fn test_invalid_requests_map_to_bad_request() {
        let app = router(state(Vec::new()));

        let (status, body) = call(
            app.clone(),
            post_json("/api/draft", serde_json::json!({ "issue": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_input");

        let (status, _) = call(
            app.clone(),
            post_json("/api/search", serde_json::json!({ "query": "refund", "top_k": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // No knowledge base configured: request paths are refused
        let (status, body) = call(
            app,
            post_json("/api/index", serde_json::json!({ "path": "/nonexistent/kb.txt" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_input");
    }

    #[tokio::test]
    async fn test_index_is_confined_to_knowledge_base_directory() {
        let kb_dir = tempfile::tempdir().unwrap();
        let kb = kb_dir.path().join("sample_docs.txt");
        std::fs::write(&kb, "[Billing] Refunds are processed within 5 business days.").unwrap();

        let other = tempfile::tempdir().unwrap();
        let secret = other.path().join("secrets.env");
        std::fs::write(&secret, "DATABASE_PASSWORD=hunter2-super-secret-value.").unwrap();

        let mut config = CopilotConfig::default();
        config.indexing.knowledge_base = Some(kb.clone());
        let state = state_with(config, Vec::new());
        let app = router(state.clone());

        let (status, body) = call(
            app.clone(),
            post_json("/api/index", serde_json::json!({ "path": secret })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_input");
        assert!(!state.is_ready());

        let (status, body) = call(
            app.clone(),
            post_json(
                "/api/index",
                serde_json::json!({ "path": kb_dir.path().join("absent.txt") }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found");

        let (status, body) = call(app.clone(), post_json("/api/index", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stored"], 1);
        assert_eq!(body["source"], "sample_docs.txt");
        assert!(state.is_ready());

        let (_, body) = call(
            app,
            post_json("/api/search", serde_json::json!({ "query": "anything" })),
        )
        .await;
        for m in body["matches"].as_array().unwrap() {
            assert_ne!(m["source"], "secrets.env");
        }
    }

    #[tokio::test]
    async fn test_tone_endpoint_degrades_to_neutral() {
        let app = router(state(vec![Err(crate::error::Error::llm("offline"))]));
        let (status, body) = call(
            app,
            post_json("/api/tone", serde_json::json!({ "message": "hello?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tone"], "neutral");
        assert!(body["degraded"].as_str().unwrap().contains("offline"));
    }
}
