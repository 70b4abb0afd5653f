use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::metrics::EmpireSnapshot;
use crate::models::Project;
use crate::patterns::{Pattern, PendingPattern, Resolution};
use crate::store::{Diagnostic, ReloadSummary};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side; clients only see a generic
/// message.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects and Diagnostics
// ============================================================

pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<Project>> {
    Json(state.store.projects())
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, (StatusCode, String)> {
    state
        .store
        .project(&id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Project not found".to_string()))
}

pub async fn list_diagnostics(State(state): State<AppState>) -> Json<Vec<Diagnostic>> {
    Json(state.store.diagnostics())
}

// ============================================================
// Metrics
// ============================================================

pub async fn get_metrics(State(state): State<AppState>) -> Json<EmpireSnapshot> {
    let scan = state.store.current();
    Json(EmpireSnapshot::compute(scan.projects()))
}

/// Response for a reload: scan totals plus any patterns the new snapshot
/// proposed against the previous one.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    #[serde(flatten)]
    pub summary: ReloadSummary,
    pub pending_patterns: Vec<PendingPattern>,
}

pub async fn reload(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, (StatusCode, String)> {
    let summary = state.store.reload().map_err(internal_error)?;

    let scan = state.store.current();
    let snapshot = EmpireSnapshot::compute(scan.projects());

    let mut last = state.last_snapshot.lock().expect("snapshot lock poisoned");
    let pending_patterns = match last.as_ref() {
        Some(previous) => state
            .detector
            .lock()
            .expect("detector lock poisoned")
            .detect(previous, &snapshot),
        None => Vec::new(),
    };
    *last = Some(snapshot);

    Ok(Json(ReloadResponse {
        summary,
        pending_patterns,
    }))
}

// ============================================================
// Patterns
// ============================================================

#[derive(Debug, Serialize)]
pub struct PatternsResponse {
    pub pending: Vec<PendingPattern>,
    pub persisted: Vec<Pattern>,
}

pub async fn list_patterns(State(state): State<AppState>) -> Json<PatternsResponse> {
    let detector = state.detector.lock().expect("detector lock poisoned");
    Json(PatternsResponse {
        pending: detector.pending(),
        persisted: detector.persisted().to_vec(),
    })
}

/// The operator's confirmation signal.
#[derive(Debug, Deserialize)]
pub struct ResolvePatternInput {
    pub accept: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolvePatternResponse {
    /// Present when the pattern was accepted and persisted.
    pub persisted: Option<Pattern>,
    pub discarded: bool,
}

pub async fn resolve_pattern(
    State(state): State<AppState>,
    Path(project_type): Path<String>,
    Json(input): Json<ResolvePatternInput>,
) -> Result<Json<ResolvePatternResponse>, (StatusCode, String)> {
    let mut detector = state.detector.lock().expect("detector lock poisoned");
    match detector.confirm(&project_type, input.accept) {
        Some(Resolution::Persisted(pattern)) => Ok(Json(ResolvePatternResponse {
            persisted: Some(pattern),
            discarded: false,
        })),
        Some(Resolution::Discarded) => Ok(Json(ResolvePatternResponse {
            persisted: None,
            discarded: true,
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            format!("No pending pattern for type: {project_type}"),
        )),
    }
}
