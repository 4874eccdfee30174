//! Knowledge base indexing endpoint

use axum::{extract::State, Json};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingestion::IndexingReport;
use crate::server::state::AppState;

/// Index request; the configured knowledge base is used when `path` is absent
#[derive(Debug, Default, Deserialize)]
pub struct IndexRequest {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// POST /api/index - Chunk, embed and store a knowledge base file
///
/// Request paths must resolve inside the directory of the configured
/// knowledge base.
pub async fn index_documents(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> Result<Json<IndexingReport>> {
    let configured = state
        .config()
        .indexing
        .knowledge_base
        .as_deref()
        .ok_or_else(|| Error::invalid("No knowledge base configured (indexing.knowledge_base)"))?;

    let path = match request.path {
        Some(requested) => resolve_within(&requested, knowledge_root(configured))?,
        None => configured.to_path_buf(),
    };

    tracing::info!("Indexing knowledge base: {}", path.display());
    let report = state.pipeline().index_documents(&path).await?;
    state.set_ready(true);

    Ok(Json(report))
}

fn knowledge_root(configured: &Path) -> &Path {
    match configured.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Canonicalize `requested` and reject it unless it lies under `root`
fn resolve_within(requested: &Path, root: &Path) -> Result<PathBuf> {
    let root = root.canonicalize().map_err(|e| {
        Error::NotFound(format!(
            "Knowledge base directory not found: {} ({})",
            root.display(),
            e
        ))
    })?;

    let resolved = if requested.exists() {
        requested.canonicalize()?
    } else {
        // Missing file: resolve its directory so the containment check still applies
        let file_name = requested
            .file_name()
            .ok_or_else(|| Error::invalid(format!("Not a file path: {}", requested.display())))?;
        let parent = knowledge_root(requested)
            .canonicalize()
            .map_err(|_| outside_root(requested))?;
        parent.join(file_name)
    };

    if !resolved.starts_with(&root) {
        tracing::warn!("Rejected index path outside {}: {}", root.display(), requested.display());
        return Err(outside_root(requested));
    }

    Ok(resolved)
}

fn outside_root(requested: &Path) -> Error {
    Error::invalid(format!(
        "Path is outside the knowledge base directory: {}",
        requested.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_paths_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let kb = dir.path().join("kb.txt");
        std::fs::write(&kb, "[Billing] Refunds take five days.").unwrap();

        let resolved = resolve_within(&kb, dir.path()).unwrap();
        assert_eq!(resolved, kb.canonicalize().unwrap());

        // Missing files inside the root pass through to the indexer's not-found error
        let missing = resolve_within(&dir.path().join("absent.txt"), dir.path()).unwrap();
        assert!(missing.ends_with("absent.txt"));
    }

    #[test]
    fn test_rejects_escapes() {
        let root = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let secret = other.path().join("secrets.env");
        std::fs::write(&secret, "DATABASE_PASSWORD=hunter2").unwrap();

        let err = resolve_within(&secret, root.path()).unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));

        let dotted = root.path().join("..").join(other.path().file_name().unwrap()).join("secrets.env");
        assert!(matches!(resolve_within(&dotted, root.path()), Err(Error::Invalid(_))));

        assert!(matches!(
            resolve_within(Path::new("/nonexistent/dir/kb.txt"), root.path()),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_knowledge_root_of_bare_file_name() {
        assert_eq!(knowledge_root(Path::new("kb.txt")), Path::new("."));
        assert_eq!(knowledge_root(Path::new("data/kb.txt")), Path::new("data"));
    }
}
