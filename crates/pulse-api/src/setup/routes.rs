//! Route configuration and setup

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use pulse_core::constants::MULTIPART_OVERHEAD_BYTES;
use pulse_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let mut routes = public_routes(state.clone())
        .merge(project_routes())
        .merge(attachment_routes(config));

    if config.scanner().simulation_enabled {
        tracing::warn!("Scan simulation routes mounted at {}/admin/scanner/simulation", API_PREFIX);
        routes = routes.merge(scanner_routes());
    }

    let app = routes
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes
fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async { handlers::health::health_check(state).await }
                }
            }),
        )
        .route(
            &format!("{}/openapi.json", API_PREFIX),
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn project_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/projects", API_PREFIX),
            post(handlers::projects::create_project),
        )
        .route(
            &format!("{}/projects/{{id}}", API_PREFIX),
            get(handlers::projects::get_project),
        )
}

/// Attachment routes. The upload route replaces axum's default body limit
/// with one just above the attachment ceiling plus multipart framing.
fn attachment_routes(config: &Config) -> Router<Arc<AppState>> {
    let body_limit = usize::try_from(config.attachment_limits().max_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            &format!("{}/projects/{{id}}/attachments", API_PREFIX),
            post(handlers::attachments::upload_attachment)
                .layer(DefaultBodyLimit::max(body_limit))
                .get(handlers::attachments::list_attachments),
        )
        .route(
            &format!("{}/projects/{{id}}/attachments/{{attachment_id}}", API_PREFIX),
            delete(handlers::attachments::delete_attachment),
        )
}

fn scanner_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/admin/scanner/simulation", API_PREFIX),
        get(handlers::scanner::get_simulation).put(handlers::scanner::set_simulation),
    )
}
