//! Skill preview server.
//!
//! Serves each skill's declared page layouts by identifier so an external
//! renderer can fetch and draw them during local iteration, without a full
//! install. The read path is stateless: every request re-reads the manifest
//! from disk, so previews reflect written-but-unreleased edits with no
//! restart, and one skill's broken manifest cannot take down the rest.

use std::path::{Component, Path, PathBuf};

use {
    axum::{
        Json, Router,
        extract::{Path as UrlPath, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
    },
    serde::Serialize,
    serde_json::{Value, json},
    thiserror::Error,
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
    walkdir::WalkDir,
};

use skillpack_manifest::{parse, types::PageDefinition, validate};

/// Default listen port for the preview server.
pub const DEFAULT_PORT: u16 = 8484;

/// Per-request failure, mapped onto an HTTP-style response. The caller must
/// be able to distinguish "doesn't exist" from "server broken".
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Invalid(msg) => (StatusCode::BAD_REQUEST, "invalid_manifest", msg),
        };
        (status, Json(json!({"error": kind, "message": message}))).into_response()
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Resolve a `pageId` into the skill's normalized page list.
///
/// The id is an opaque path segment (it may encode a nested skill path
/// below the preview root). Whatever shape the manifest declares, the
/// result is always a uniform list of `{pageId, title, layout}` in
/// declaration order; a legacy bare layout becomes a one-element list with
/// a synthesized title.
pub fn resolve_preview(
    skills_root: &Path,
    page_id: &str,
) -> Result<Vec<PageDefinition>, PreviewError> {
    let rel = sanitize_page_id(page_id)
        .ok_or_else(|| PreviewError::NotFound(format!("unknown preview id '{page_id}'")))?;
    let skill_dir = skills_root.join(rel);
    if parse::manifest_path(&skill_dir).is_none() {
        return Err(PreviewError::NotFound(format!(
            "no skill manifest under '{page_id}'"
        )));
    }

    let raw = parse::read_raw(&skill_dir).map_err(|e| PreviewError::Invalid(format!("{e:#}")))?;
    let manifest = validate::validate(&raw).map_err(|errors| {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        PreviewError::Invalid(joined)
    })?;

    Ok(manifest
        .page_definitions()
        .into_iter()
        .map(|mut page| {
            page.layout = expand_layout(page.layout);
            page
        })
        .collect())
}

/// A `pageId` must stay below the preview root: only normal path segments,
/// no traversal, no absolute paths. Anything else is simply unresolvable.
fn sanitize_page_id(page_id: &str) -> Option<PathBuf> {
    let trimmed = page_id.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let path = Path::new(trimmed);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| path.to_path_buf())
}

/// Layouts are sometimes authored as JSON embedded in a string; expand those
/// so the preview is readable. Invalid embedded JSON passes through as-is so
/// the author can still inspect it.
fn expand_layout(layout: Value) -> Value {
    match layout {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(text),
        },
        other => other,
    }
}

// ── Index ────────────────────────────────────────────────────────────────────

/// One previewable skill found under the preview root.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewIndexEntry {
    /// Id to fetch this skill's pages with.
    pub page_id: String,
    pub name: String,
    pub titles: Vec<String>,
}

/// Scan the preview root for skill directories (any directory holding a
/// manifest). Skills with broken manifests are skipped, not fatal.
pub fn list_previews(skills_root: &Path) -> Vec<PreviewIndexEntry> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(skills_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .flatten()
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let skill_dir = entry.path();
        if parse::manifest_path(skill_dir).is_none() {
            continue;
        }
        let Ok(rel) = skill_dir.strip_prefix(skills_root) else {
            continue;
        };
        let page_id = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match parse::read_raw(skill_dir).map_err(|e| e.to_string()).and_then(|raw| {
            validate::validate(&raw).map_err(|errors| {
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            })
        }) {
            Ok(manifest) => {
                let titles = manifest
                    .page_definitions()
                    .into_iter()
                    .map(|p| p.title)
                    .collect();
                entries.push(PreviewIndexEntry {
                    page_id,
                    name: manifest.name,
                    titles,
                });
            },
            Err(e) => {
                tracing::debug!(skill = %skill_dir.display(), %e, "skipping non-conforming skill");
            },
        }
    }
    entries
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct PreviewState {
    skills_root: PathBuf,
}

/// Build the preview router (shared between production startup and tests).
pub fn build_preview_app(skills_root: PathBuf) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/previews", get(list_previews_handler))
        .route("/previews/{*page_id}", get(get_preview_handler))
        .layer(cors)
        .with_state(PreviewState { skills_root })
}

/// Run the preview server until terminated.
pub async fn serve(skills_root: PathBuf, port: u16) -> anyhow::Result<()> {
    let app = build_preview_app(skills_root.clone());
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!(
        port,
        root = %skills_root.display(),
        "preview server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

// Resolution is synchronous filesystem work, so it runs on the blocking
// pool rather than stalling an async worker on slow disks.
async fn get_preview_handler(
    State(state): State<PreviewState>,
    UrlPath(page_id): UrlPath<String>,
) -> Response {
    match tokio::task::spawn_blocking(move || resolve_preview(&state.skills_root, &page_id)).await {
        Ok(Ok(pages)) => Json(pages).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => internal_error(&e),
    }
}

async fn list_previews_handler(State(state): State<PreviewState>) -> Response {
    match tokio::task::spawn_blocking(move || list_previews(&state.skills_root)).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => internal_error(&e),
    }
}

fn internal_error(e: &tokio::task::JoinError) -> Response {
    tracing::error!(%e, "preview task failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "internal", "message": "preview task failed"})),
    )
        .into_response()
}
