//! Project, health, and OpenAPI integration tests.
//!
//! Run with: `cargo test -p pulse-api --test projects_test`

mod helpers;

use helpers::{api_path, assert_rejected, setup_test_app};
use pulse_core::constants::DEFAULT_ORGANIZATION_ID;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_get_project() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/projects"))
        .json(&serde_json::json!({ "name": "  Onboarding  " }))
        .await;
    assert_eq!(response.status_code(), 201);
    let project: serde_json::Value = response.json();
    assert_eq!(project["name"], "Onboarding");
    assert_eq!(project["organizationId"], DEFAULT_ORGANIZATION_ID.to_string());
    assert!(project["createdAt"].is_string());

    let id = project["_id"].as_str().unwrap();
    let response = app
        .client()
        .get(&api_path(&format!("/projects/{}", id)))
        .await;
    assert_eq!(response.status_code(), 200);
    let fetched: serde_json::Value = response.json();
    assert_eq!(fetched["_id"], project["_id"]);
}

#[tokio::test]
async fn test_project_name_is_validated() {
    let app = setup_test_app().await;

    for name in [String::new(), "   ".to_string(), "x".repeat(201)] {
        let response = app
            .client()
            .post(&api_path("/projects"))
            .json(&serde_json::json!({ "name": name }))
            .await;
        assert_rejected(&response, 400, "invalid_input");
    }
}

#[tokio::test]
async fn test_malformed_project_body_is_invalid_input() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/projects"))
        .json(&serde_json::json!({ "title": "wrong field" }))
        .await;
    assert_rejected(&response, 400, "invalid_input");
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path(&format!("/projects/{}", Uuid::new_v4())))
        .await;
    assert_rejected(&response, 404, "project_not_found");
}

#[tokio::test]
async fn test_forwarded_organization_scopes_projects() {
    let app = setup_test_app().await;
    let org = Uuid::new_v4();

    let response = app
        .client()
        .post(&api_path("/projects"))
        .add_header("X-Organization-Id", org.to_string())
        .json(&serde_json::json!({ "name": "Tenant project" }))
        .await;
    assert_eq!(response.status_code(), 201);
    let project: serde_json::Value = response.json();
    assert_eq!(project["organizationId"], org.to_string());
    let path = api_path(&format!("/projects/{}", project["_id"].as_str().unwrap()));

    let visible = app
        .client()
        .get(&path)
        .add_header("X-Organization-Id", org.to_string())
        .await;
    assert_eq!(visible.status_code(), 200);

    let hidden = app.client().get(&path).await;
    assert_rejected(&hidden, 404, "project_not_found");
}

#[tokio::test]
async fn test_malformed_organization_header_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/projects"))
        .add_header("X-Organization-Id", "not-a-uuid")
        .json(&serde_json::json!({ "name": "Onboarding" }))
        .await;
    assert_rejected(&response, 400, "invalid_input");
}

#[tokio::test]
async fn test_health_reports_staging() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "in-memory");
    assert_eq!(body["scanner"], "disabled");
    assert_eq!(body["staged_uploads"], 0);
}

#[tokio::test]
async fn test_openapi_document_lists_upload_route() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/openapi.json")).await;
    assert_eq!(response.status_code(), 200);
    let document: serde_json::Value = response.json();
    assert!(document["paths"]
        .get("/api/projects/{id}/attachments")
        .is_some());
}
