//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use pulse_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pulse API",
        version = "0.1.0",
        description = "Project attachment ingestion. Uploads are streamed, checked against the configured size and type constraints, malware-scanned, and only then committed."
    ),
    paths(
        // Projects
        handlers::projects::create_project,
        handlers::projects::get_project,
        // Attachments
        handlers::attachments::upload_attachment,
        handlers::attachments::list_attachments,
        handlers::attachments::delete_attachment,
        // Scanner
        handlers::scanner::get_simulation,
        handlers::scanner::set_simulation,
    ),
    components(
        schemas(
            models::Project,
            models::CreateProjectRequest,
            models::Attachment,
            models::AttachmentStatus,
            pulse_core::RejectReason,
            pulse_services::SimulationMode,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "projects", description = "Projects that own attachments"),
        (name = "attachments", description = "Attachment upload, listing, and deletion"),
        (name = "scanner", description = "Scan simulation toggle (non-production only)")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
