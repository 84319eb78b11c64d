use chrono::{DateTime, Utc};
use pulse_core::{
    models::{Attachment, AttachmentStatus, NewAttachment},
    AppError,
};
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// Persistence of committed attachments.
///
/// Rows are written once at commit time and only ever read or deleted
/// afterwards; there is no update.
#[async_trait::async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Insert a committed attachment. The repository assigns `created_at`.
    async fn create(&self, attachment: NewAttachment) -> Result<Attachment, AppError>;

    /// All attachments of a project in creation order.
    async fn list_by_project(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Attachment>, AppError>;

    async fn get(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError>;

    /// Delete and return the row, or `None` if it did not exist.
    async fn delete(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError>;
}

const ATTACHMENT_COLUMNS: &str = "id, project_id, organization_id, original_filename, media_type, \
size_bytes, checksum_sha256, storage_ref, status, created_at";

#[derive(Debug, FromRow)]
struct AttachmentRow {
    id: Uuid,
    project_id: Uuid,
    organization_id: Uuid,
    original_filename: String,
    media_type: String,
    size_bytes: i64,
    checksum_sha256: String,
    storage_ref: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttachmentRow> for Attachment {
    type Error = AppError;

    fn try_from(row: AttachmentRow) -> Result<Self, Self::Error> {
        let status: AttachmentStatus = row.status.parse().map_err(AppError::Internal)?;
        let size_bytes = u64::try_from(row.size_bytes)
            .map_err(|_| AppError::Internal(format!("negative size for attachment {}", row.id)))?;

        Ok(Attachment {
            id: row.id,
            project_id: row.project_id,
            organization_id: row.organization_id,
            original_filename: row.original_filename,
            media_type: row.media_type,
            size_bytes,
            checksum_sha256: row.checksum_sha256,
            storage_ref: row.storage_ref,
            status,
            created_at: row.created_at,
        })
    }
}

/// Repository for managing attachments
#[derive(Clone)]
pub struct PostgresAttachmentRepository {
    pool: PgPool,
}

impl PostgresAttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AttachmentRepository for PostgresAttachmentRepository {
    #[tracing::instrument(skip(self, attachment), fields(
        db.table = "attachments",
        db.operation = "insert",
        db.record_id = %attachment.id
    ))]
    async fn create(&self, attachment: NewAttachment) -> Result<Attachment, AppError> {
        let size_bytes = i64::try_from(attachment.size_bytes)
            .map_err(|_| AppError::InvalidInput("attachment size out of range".to_string()))?;

        let query = format!(
            r#"
            INSERT INTO attachments
                (id, project_id, organization_id, original_filename, media_type,
                 size_bytes, checksum_sha256, storage_ref, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, AttachmentRow>(&query)
            .bind(attachment.id)
            .bind(attachment.project_id)
            .bind(attachment.organization_id)
            .bind(&attachment.original_filename)
            .bind(&attachment.media_type)
            .bind(size_bytes)
            .bind(&attachment.checksum_sha256)
            .bind(&attachment.storage_ref)
            .bind(AttachmentStatus::Committed.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select"))]
    async fn list_by_project(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Attachment>, AppError> {
        let query = format!(
            "SELECT {} FROM attachments WHERE organization_id = $1 AND project_id = $2 ORDER BY created_at ASC, seq ASC",
            ATTACHMENT_COLUMNS
        );

        let rows = sqlx::query_as::<Postgres, AttachmentRow>(&query)
            .bind(organization_id)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Attachment::try_from).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "select", db.record_id = %id))]
    async fn get(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        let query = format!(
            "SELECT {} FROM attachments WHERE organization_id = $1 AND project_id = $2 AND id = $3",
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, AttachmentRow>(&query)
            .bind(organization_id)
            .bind(project_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Attachment::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "attachments", db.operation = "delete", db.record_id = %id))]
    async fn delete(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        let query = format!(
            "DELETE FROM attachments WHERE organization_id = $1 AND project_id = $2 AND id = $3 RETURNING {}",
            ATTACHMENT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, AttachmentRow>(&query)
            .bind(organization_id)
            .bind(project_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Attachment::try_from).transpose()
    }
}
