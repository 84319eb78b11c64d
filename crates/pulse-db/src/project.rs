use chrono::{DateTime, Utc};
use pulse_core::{models::Project, AppError};
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// Organization-scoped project lookups needed by the upload pipeline.
#[async_trait::async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, organization_id: Uuid, name: &str) -> Result<Project, AppError>;

    /// A project of another organization is reported as absent.
    async fn get(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Project>, AppError>;
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Repository for managing projects
#[derive(Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProjectRepository for PostgresProjectRepository {
    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "insert"))]
    async fn create(&self, organization_id: Uuid, name: &str) -> Result<Project, AppError> {
        let row = sqlx::query_as::<Postgres, ProjectRow>(
            r#"
            INSERT INTO projects (id, organization_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, organization_id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select", db.record_id = %id))]
    async fn get(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Project>, AppError> {
        let row = sqlx::query_as::<Postgres, ProjectRow>(
            "SELECT id, organization_id, name, created_at FROM projects WHERE organization_id = $1 AND id = $2",
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Project::from))
    }
}
