use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Minimal project record. Projects are organization-scoped; the upload
/// pipeline only needs to know that one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for creating a project
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Project name must be between 1 and 200 characters"
    ))]
    pub name: String,
}
