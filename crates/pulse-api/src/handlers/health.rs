//! Health check handler

use crate::state::AppState;
use axum::{http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

#[derive(serde::Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub scanner: String,
    /// Uploads currently held in staging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged_uploads: Option<usize>,
}

pub async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let (storage, staged_uploads) =
        match tokio::time::timeout(TIMEOUT, state.store.staged_count()).await {
            Ok(Ok(count)) => ("healthy".to_string(), Some(count)),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Storage health check failed");
                (format!("unhealthy: {}", e), None)
            }
            Err(_) => ("timeout".to_string(), None),
        };

    let healthy = staged_uploads.is_some();
    let response = HealthCheckResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        database: state.repository_backend.to_string(),
        storage,
        scanner: state.ingestion.scanner().engine_name().to_string(),
        staged_uploads,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
