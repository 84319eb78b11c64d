//! Repository factory

use std::sync::Arc;

use sqlx::PgPool;

use crate::attachment::{AttachmentRepository, PostgresAttachmentRepository};
use crate::memory::{InMemoryAttachmentRepository, InMemoryProjectRepository};
use crate::project::{PostgresProjectRepository, ProjectRepository};

/// The repositories the application state holds.
#[derive(Clone)]
pub struct Repositories {
    pub projects: Arc<dyn ProjectRepository>,
    pub attachments: Arc<dyn AttachmentRepository>,
    /// Backend name for health reporting
    pub backend: &'static str,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            projects: Arc::new(InMemoryProjectRepository::new()),
            attachments: Arc::new(InMemoryAttachmentRepository::new()),
            backend: "in-memory",
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            projects: Arc::new(PostgresProjectRepository::new(pool.clone())),
            attachments: Arc::new(PostgresAttachmentRepository::new(pool)),
            backend: "postgres",
        }
    }
}

/// Factory function selecting PostgreSQL when a pool is available and the
/// in-memory repositories otherwise.
pub fn create_repositories(pool: Option<PgPool>) -> Repositories {
    match pool {
        Some(pool) => {
            tracing::info!("Initializing PostgreSQL repositories");
            Repositories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory repositories (data is not persisted)");
            Repositories::in_memory()
        }
    }
}
