//! JSON surface for external presenters (CLI, dashboard).
//!
//! The API owns no aggregation logic; every route is a thin edge over the
//! store, the aggregator, and the detector.

mod handlers;

use std::sync::{Arc, Mutex};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::metrics::EmpireSnapshot;
use crate::patterns::PatternDetector;
use crate::store::ManifestStore;

/// Shared state behind the report API.
///
/// The server is the "external caller" that retains snapshots between runs:
/// `last_snapshot` holds the baseline the detector compares the next reload
/// against. Nothing is written to disk.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ManifestStore>,
    pub detector: Arc<Mutex<PatternDetector>>,
    pub last_snapshot: Arc<Mutex<Option<EmpireSnapshot>>>,
}

impl AppState {
    pub fn new(store: ManifestStore, detector: PatternDetector) -> Self {
        Self {
            store: Arc::new(store),
            detector: Arc::new(Mutex::new(detector)),
            last_snapshot: Arc::new(Mutex::new(None)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Projects and diagnostics
        .route("/projects", get(handlers::list_projects))
        .route("/projects/{id}", get(handlers::get_project))
        .route("/diagnostics", get(handlers::list_diagnostics))
        // Metrics
        .route("/metrics", get(handlers::get_metrics))
        .route("/reload", post(handlers::reload))
        // Patterns
        .route("/patterns", get(handlers::list_patterns))
        .route("/patterns/{project_type}/resolve", post(handlers::resolve_pattern))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
