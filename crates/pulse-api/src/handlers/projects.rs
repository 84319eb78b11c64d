use crate::auth::OrgContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use pulse_core::models::{CreateProjectRequest, Project};
use pulse_core::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ctx: OrgContext,
    ValidatedJson(request): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), HttpAppError> {
    request.validate()?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Project name cannot be blank".to_string()).into());
    }

    let project = state.projects.create(ctx.organization_id, name).await?;
    tracing::info!(
        project_id = %project.id,
        organization_id = %ctx.organization_id,
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    ctx: OrgContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, HttpAppError> {
    let project = find_project(&state, &ctx, id).await?;
    Ok(Json(project))
}

/// Look up a project in the caller's organization.
pub(crate) async fn find_project(
    state: &AppState,
    ctx: &OrgContext,
    id: Uuid,
) -> Result<Project, AppError> {
    state
        .projects
        .get(ctx.organization_id, id)
        .await?
        .ok_or(AppError::ProjectNotFound(id))
}
