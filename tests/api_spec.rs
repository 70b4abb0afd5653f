use axum::http::StatusCode;
use axum_test::TestServer;
use foundry_hub::api::{create_router, AppState};
use foundry_hub::manifest::ManifestValidator;
use foundry_hub::models::Project;
use foundry_hub::patterns::PatternDetector;
use foundry_hub::store::ManifestStore;
use serde_json::{json, Value};
use tempfile::TempDir;

fn write_manifest(dir: &TempDir, file: &str, json: &Value) {
    std::fs::write(
        dir.path().join(file),
        serde_json::to_string_pretty(json).expect("Failed to encode manifest"),
    )
    .expect("Failed to write manifest");
}

fn setup(dir: &TempDir) -> TestServer {
    let store =
        ManifestStore::load(dir.path(), ManifestValidator::default()).expect("Failed to scan");
    let app = create_router(AppState::new(store, PatternDetector::default()));
    TestServer::new(app).expect("Failed to create test server")
}

fn marketplace_manifest(tasks_done: usize) -> Value {
    let tasks: Vec<Value> = (0..4usize)
        .map(|i| {
            json!({
                "description": format!("Milestone {i}"),
                "status": if i < tasks_done { "done" } else { "pending" },
            })
        })
        .collect();
    json!({
        "name": "SEOEasy Directory",
        "type": "marketplace",
        "status": "production",
        "revenue": "$8,500",
        "users": 1200,
        "tasks": tasks,
    })
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn lists_the_valid_project_set() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_manifest(
            &dir,
            "hugemouth.json",
            &json!({
                "name": "HugemouthSEO",
                "type": "SaaS",
                "status": "production",
                "revenue": "$12,500",
            }),
        );
        let server = setup(&dir);

        let response = server.get("/api/v1/projects").await;
        response.assert_status_ok();

        let projects: Vec<Project> = response.json();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "HugemouthSEO");
    }

    #[tokio::test]
    async fn returns_404_for_an_unknown_project() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = setup(&dir);

        let response = server.get("/api/v1/projects/nope").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fetches_a_project_by_id() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_manifest(
            &dir,
            "hugemouth.json",
            &json!({
                "name": "HugemouthSEO",
                "type": "SaaS",
                "status": "production",
            }),
        );
        let server = setup(&dir);

        let response = server.get("/api/v1/projects/hugemouth").await;
        response.assert_status_ok();
        let project: Project = response.json();
        assert_eq!(project.id, "hugemouth");
    }
}

mod diagnostics {
    use super::*;

    #[tokio::test]
    async fn lists_rejections_without_hiding_valid_projects() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_manifest(
            &dir,
            "good.json",
            &json!({ "name": "Good", "type": "SaaS", "status": "planning" }),
        );
        write_manifest(&dir, "bad.json", &json!({ "name": "Bad", "type": "SaaS" }));
        let server = setup(&dir);

        let diagnostics: Vec<Value> = server.get("/api/v1/diagnostics").await.json();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0]["severity"], "error");
        assert_eq!(diagnostics[0]["error"]["kind"], "schema");

        let projects: Vec<Project> = server.get("/api/v1/projects").await.json();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Good");
    }
}

mod metrics {
    use super::*;

    #[tokio::test]
    async fn reports_empire_totals_across_projects() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_manifest(
            &dir,
            "hugemouth.json",
            &json!({
                "name": "HugemouthSEO",
                "type": "SaaS",
                "status": "production",
                "revenue": "$12,500",
                "users": 450,
            }),
        );
        write_manifest(
            &dir,
            "seoeasy.json",
            &json!({
                "name": "SEOEasy Directory",
                "type": "marketplace",
                "status": "production",
                "revenue": "$8,500",
                "users": 1200,
            }),
        );
        let server = setup(&dir);

        let snapshot: Value = server.get("/api/v1/metrics").await.json();
        assert_eq!(snapshot["total_projects"], 2);
        assert_eq!(snapshot["active_projects"], 2);
        // Cents: $21,000.00
        assert_eq!(snapshot["total_revenue"], 2_100_000);
        assert_eq!(snapshot["status_distribution"]["production"], 2);
    }
}

mod reload {
    use super::*;

    #[tokio::test]
    async fn picks_up_manifests_dropped_in_after_startup() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = setup(&dir);

        let projects: Vec<Project> = server.get("/api/v1/projects").await.json();
        assert!(projects.is_empty());

        write_manifest(
            &dir,
            "late.json",
            &json!({ "name": "Late Arrival", "type": "SaaS", "status": "planning" }),
        );
        let response = server.post("/api/v1/reload").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["projects"], 1);
        assert_eq!(body["rejected"], 0);

        let projects: Vec<Project> = server.get("/api/v1/projects").await.json();
        assert_eq!(projects.len(), 1);
    }
}

mod patterns {
    use super::*;

    /// Reload twice around a completion-rate jump to stage a pending
    /// pattern for the marketplace type.
    async fn stage_pending(dir: &TempDir, server: &TestServer) {
        write_manifest(dir, "seoeasy.json", &marketplace_manifest(1));
        server.post("/api/v1/reload").await.assert_status_ok();

        write_manifest(dir, "seoeasy.json", &marketplace_manifest(2));
        let body: Value = server.post("/api/v1/reload").await.json();
        assert_eq!(body["pending_patterns"][0]["project_type"], "marketplace");
    }

    #[tokio::test]
    async fn first_reload_has_no_baseline_to_compare() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write_manifest(&dir, "seoeasy.json", &marketplace_manifest(2));
        let server = setup(&dir);

        let body: Value = server.post("/api/v1/reload").await.json();
        assert_eq!(body["pending_patterns"], json!([]));
    }

    #[tokio::test]
    async fn accepting_a_pending_pattern_persists_it() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = setup(&dir);
        stage_pending(&dir, &server).await;

        let response = server
            .post("/api/v1/patterns/marketplace/resolve")
            .json(&json!({ "accept": true }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["discarded"], false);
        assert_eq!(body["persisted"]["project_type"], "marketplace");

        let patterns: Value = server.get("/api/v1/patterns").await.json();
        assert_eq!(patterns["pending"], json!([]));
        assert_eq!(patterns["persisted"][0]["metric"], "completion_rate");
    }

    #[tokio::test]
    async fn rejecting_a_pending_pattern_leaves_nothing_persisted() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = setup(&dir);
        stage_pending(&dir, &server).await;

        let response = server
            .post("/api/v1/patterns/marketplace/resolve")
            .json(&json!({ "accept": false }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["discarded"], true);
        assert_eq!(body["persisted"], Value::Null);

        let patterns: Value = server.get("/api/v1/patterns").await.json();
        assert_eq!(patterns["pending"], json!([]));
        assert_eq!(patterns["persisted"], json!([]));
    }

    #[tokio::test]
    async fn resolving_with_nothing_pending_is_404() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = setup(&dir);

        let response = server
            .post("/api/v1/patterns/marketplace/resolve")
            .json(&json!({ "accept": true }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
