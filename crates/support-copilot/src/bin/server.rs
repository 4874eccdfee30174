//! Support copilot server binary
//!
//! Run with: cargo run -p support-copilot --bin support-copilot-server
//!
//! Reads `COPILOT_CONFIG` for an optional TOML file; secrets come from the
//! environment.

use std::path::PathBuf;

use support_copilot::{
    config::CopilotConfig,
    logging,
    server::{state::AppState, CopilotServer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("COPILOT_CONFIG").map(PathBuf::from);
    let config = CopilotConfig::load(config_path.as_deref())?;

    let _log_guard = logging::init(&config.logging);

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Support Copilot                       ║
║        Grounded reply drafting for support agents         ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.openai.embedding_model);
    tracing::info!("  - Embedding dimensions: {}", config.openai.embedding_dimensions);
    tracing::info!("  - Generation model: {}", config.openai.generation_model);
    tracing::info!("  - Vector index: {:?}", config.vector_index.backend);
    tracing::info!("  - Chunk target size: {}", config.chunking.target_size);

    let knowledge_base = config.indexing.knowledge_base.clone();
    let state = AppState::connect(config).await?;

    match knowledge_base {
        Some(path) => match state.pipeline().index_documents(&path).await {
            Ok(report) => {
                tracing::info!(
                    "Knowledge base indexed: {}/{} chunks stored from {}",
                    report.stored,
                    report.chunks,
                    report.source
                );
                state.set_ready(true);
            }
            Err(e) => {
                tracing::error!("Document indexing failed: {}", e);
                return Err(e.into());
            }
        },
        None => {
            tracing::info!("No knowledge base configured; serving the existing index");
            state.set_ready(true);
        }
    }

    let server = CopilotServer::new(state);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/draft   - Draft a reply");
    println!("  POST /api/search  - Search the knowledge base");
    println!("  POST /api/index   - Index a knowledge base file");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
