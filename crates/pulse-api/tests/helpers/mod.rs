//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs against in-memory repositories and a local storage root in
//! a temp dir, so no database or ClamAV daemon is needed.

#![allow(dead_code)]

pub mod engines;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use pulse_api::constants;
use pulse_api::setup::{routes, services};
use pulse_api::AppState;
use pulse_core::config::{BaseConfig, PulseConfig};
use pulse_core::{AttachmentLimits, Config, ScannerConfig};
use pulse_db::Repositories;
use pulse_services::{DisabledEngine, ScanEngine};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Attachment ceiling used by the tests.
pub const TEST_MAX_SIZE_BYTES: u64 = 1024;

/// API path prefix for tests (e.g. `/api/projects`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub struct TestOptions {
    pub max_size_bytes: u64,
    pub simulation_enabled: bool,
    pub simulate_infected: bool,
    pub scan_timeout_secs: u64,
    pub engine: Arc<dyn ScanEngine>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: TEST_MAX_SIZE_BYTES,
            simulation_enabled: false,
            simulate_infected: false,
            scan_timeout_secs: 5,
            engine: Arc::new(DisabledEngine),
        }
    }
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Number of staging entries currently on disk.
    pub async fn staged_count(&self) -> usize {
        self.state
            .store
            .staged_count()
            .await
            .expect("Failed to count staging entries")
    }

    pub async fn create_project(&self, name: &str) -> Uuid {
        let response = self
            .server
            .post(&api_path("/projects"))
            .json(&serde_json::json!({ "name": name }))
            .await;
        assert_eq!(response.status_code(), 201);
        let body: serde_json::Value = response.json();
        Uuid::parse_str(body["_id"].as_str().expect("Expected '_id' in project response"))
            .expect("Invalid UUID in project response")
    }

    pub async fn upload(
        &self,
        project_id: Uuid,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> TestResponse {
        self.server
            .post(&api_path(&format!("/projects/{}/attachments", project_id)))
            .multipart(file_form(filename, content_type, data))
            .await
    }

    pub async fn list(&self, project_id: Uuid) -> Vec<serde_json::Value> {
        let response = self
            .server
            .get(&api_path(&format!("/projects/{}/attachments", project_id)))
            .await;
        assert_eq!(response.status_code(), 200);
        response.json()
    }
}

/// A multipart form with a single `file` field.
pub fn file_form(filename: &str, content_type: &str, data: &[u8]) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::copy_from_slice(data))
        .file_name(filename.to_string())
        .mime_type(content_type.to_string());
    MultipartForm::new().add_part("file", part)
}

/// Assert a rejection response and return its body.
pub fn assert_rejected(response: &TestResponse, status: u16, code: &str) -> serde_json::Value {
    assert_eq!(response.status_code(), status, "body: {}", response.text());
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], code, "body: {}", body);
    body
}

/// Setup test app with default options.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

/// Setup test app with in-memory repositories and local storage in a temp dir.
pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(temp_dir.path(), &options);

    let store = pulse_storage::create_staging_store(&config)
        .await
        .expect("Failed to create staging store");
    let state = Arc::new(services::build_state(
        &config,
        Repositories::in_memory(),
        store,
        options.engine,
    ));

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

fn create_test_config(storage_root: &Path, options: &TestOptions) -> Config {
    Config::new(PulseConfig {
        base: BaseConfig {
            server_port: 3000,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 30,
            environment: "test".to_string(),
        },
        database_url: None,
        storage_root: storage_root.to_string_lossy().to_string(),
        attachments: AttachmentLimits {
            max_size_bytes: options.max_size_bytes,
            ..AttachmentLimits::default()
        },
        scanner: ScannerConfig {
            timeout_secs: options.scan_timeout_secs,
            simulation_enabled: options.simulation_enabled,
            simulate_infected: options.simulate_infected,
            ..ScannerConfig::default()
        },
        staging_max_age_secs: 3600,
    })
}
