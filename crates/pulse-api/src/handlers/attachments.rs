use crate::auth::OrgContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::projects::find_project;
use crate::middleware::audit;
use crate::state::AppState;
use crate::utils::upload::{into_byte_stream, missing_file_field, next_field, FILE_FIELD};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use pulse_core::models::Attachment;
use pulse_services::{IngestOutcome, IngestRequest};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/projects/{id}/attachments",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Attachment committed", body = Attachment),
        (status = 400, description = "Upload rejected (too_large, invalid_type, invalid_filename, empty_file, scan_failed, aborted)", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Storage or internal failure", body = ErrorResponse)
    )
)]
pub async fn upload_attachment(
    State(state): State<Arc<AppState>>,
    ctx: OrgContext,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Attachment>), HttpAppError> {
    // The project must exist before a single body byte is read.
    find_project(&state, &ctx, project_id).await?;

    let limit_bytes = state.ingestion.policy().max_size_bytes();

    while let Some(field) = next_field(&mut multipart, limit_bytes).await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let (part, body) = into_byte_stream(field);
        tracing::debug!(
            project_id = %project_id,
            filename = %part.filename,
            content_type = %part.content_type,
            "Receiving attachment"
        );

        let request = IngestRequest {
            organization_id: ctx.organization_id,
            project_id,
            filename: part.filename,
            declared_media_type: part.content_type,
        };

        return match state.ingestion.ingest(request, body).await {
            IngestOutcome::Committed(attachment) => {
                audit::log_attachment_committed(&ctx, &attachment);
                Ok((StatusCode::CREATED, Json(attachment)))
            }
            IngestOutcome::Rejected(rejection) => {
                audit::log_attachment_rejected(&ctx, project_id, &rejection);
                Err(HttpAppError(rejection.into()))
            }
        };
    }

    Err(missing_file_field().into())
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/attachments",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Committed attachments in creation order", body = Vec<Attachment>),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    ctx: OrgContext,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Attachment>>, HttpAppError> {
    find_project(&state, &ctx, project_id).await?;
    let attachments = state
        .attachments
        .list(ctx.organization_id, project_id)
        .await?;
    Ok(Json(attachments))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}/attachments/{attachment_id}",
    tag = "attachments",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 204, description = "Attachment and its bytes deleted"),
        (status = 404, description = "Attachment not found", body = ErrorResponse)
    )
)]
pub async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    ctx: OrgContext,
    Path((project_id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, HttpAppError> {
    let attachment = state
        .attachments
        .delete(ctx.organization_id, project_id, attachment_id)
        .await?;
    audit::log_attachment_deleted(&ctx, &attachment);
    Ok(StatusCode::NO_CONTENT)
}
