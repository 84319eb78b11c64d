use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use pulse_services::SimulationMode;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/admin/scanner/simulation",
    tag = "scanner",
    responses(
        (status = 200, description = "Current scan simulation mode", body = SimulationMode)
    )
)]
pub async fn get_simulation(State(state): State<Arc<AppState>>) -> Json<SimulationMode> {
    Json(state.scan_simulation.mode())
}

#[utoipa::path(
    put,
    path = "/api/admin/scanner/simulation",
    tag = "scanner",
    request_body = SimulationMode,
    responses(
        (status = 200, description = "Scan simulation mode updated", body = SimulationMode),
        (status = 400, description = "Invalid mode", body = ErrorResponse)
    )
)]
pub async fn set_simulation(
    State(state): State<Arc<AppState>>,
    ValidatedJson(mode): ValidatedJson<SimulationMode>,
) -> Result<Json<SimulationMode>, HttpAppError> {
    state.scan_simulation.set(mode);
    tracing::warn!(
        mode = ?mode,
        engine = state.ingestion.scanner().engine_name(),
        "Scan simulation mode changed"
    );
    Ok(Json(state.scan_simulation.mode()))
}
