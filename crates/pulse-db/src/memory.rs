//! In-memory repositories
//!
//! Used when no `DATABASE_URL` is configured outside production, and by the
//! test suites. Same scoping and ordering rules as the PostgreSQL versions.

use std::sync::Arc;

use chrono::Utc;
use pulse_core::{
    models::{Attachment, NewAttachment, Project},
    AppError,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::attachment::AttachmentRepository;
use crate::project::ProjectRepository;

#[derive(Clone, Default)]
pub struct InMemoryProjectRepository {
    projects: Arc<RwLock<Vec<Project>>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn create(&self, organization_id: Uuid, name: &str) -> Result<Project, AppError> {
        let project = Project {
            id: Uuid::new_v4(),
            organization_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.projects.write().await.push(project.clone());
        Ok(project)
    }

    async fn get(&self, organization_id: Uuid, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .find(|p| p.id == id && p.organization_id == organization_id)
            .cloned())
    }
}

/// Rows are kept in insertion order, which doubles as the creation sequence.
#[derive(Clone, Default)]
pub struct InMemoryAttachmentRepository {
    attachments: Arc<RwLock<Vec<Attachment>>>,
}

impl InMemoryAttachmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows across all projects.
    pub async fn len(&self) -> usize {
        self.attachments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.attachments.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl AttachmentRepository for InMemoryAttachmentRepository {
    async fn create(&self, attachment: NewAttachment) -> Result<Attachment, AppError> {
        let mut rows = self.attachments.write().await;
        if rows
            .iter()
            .any(|a| a.id == attachment.id || a.storage_ref == attachment.storage_ref)
        {
            return Err(AppError::Internal(format!(
                "duplicate attachment {}",
                attachment.id
            )));
        }
        let attachment = attachment.into_attachment(Utc::now());
        rows.push(attachment.clone());
        Ok(attachment)
    }

    async fn list_by_project(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Attachment>, AppError> {
        let mut list: Vec<Attachment> = self
            .attachments
            .read()
            .await
            .iter()
            .filter(|a| a.organization_id == organization_id && a.project_id == project_id)
            .cloned()
            .collect();
        // Stable: ties keep insertion order.
        list.sort_by_key(|a| a.created_at);
        Ok(list)
    }

    async fn get(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        Ok(self
            .attachments
            .read()
            .await
            .iter()
            .find(|a| {
                a.id == id && a.organization_id == organization_id && a.project_id == project_id
            })
            .cloned())
    }

    async fn delete(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Attachment>, AppError> {
        let mut rows = self.attachments.write().await;
        let position = rows.iter().position(|a| {
            a.id == id && a.organization_id == organization_id && a.project_id == project_id
        });
        Ok(position.map(|idx| rows.remove(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_attachment(org: Uuid, project: Uuid, name: &str) -> NewAttachment {
        let id = Uuid::new_v4();
        NewAttachment {
            id,
            project_id: project,
            organization_id: org,
            original_filename: name.to_string(),
            media_type: "text/plain".to_string(),
            size_bytes: 3,
            checksum_sha256: "0".repeat(64),
            storage_ref: format!("attachments/{}/{}/{}", org, project, id),
        }
    }

    #[tokio::test]
    async fn projects_are_organization_scoped() {
        let repo = InMemoryProjectRepository::new();
        let org = Uuid::new_v4();
        let project = repo.create(org, "Q3 survey").await.unwrap();

        assert_eq!(repo.get(org, project.id).await.unwrap(), Some(project.clone()));
        assert_eq!(repo.get(Uuid::new_v4(), project.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_preserves_creation_order() {
        let repo = InMemoryAttachmentRepository::new();
        let org = Uuid::new_v4();
        let project = Uuid::new_v4();
        for name in ["a.txt", "b.txt", "c.txt"] {
            repo.create(new_attachment(org, project, name)).await.unwrap();
        }
        repo.create(new_attachment(org, Uuid::new_v4(), "other.txt"))
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_by_project(org, project)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.original_filename)
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn delete_returns_row_once() {
        let repo = InMemoryAttachmentRepository::new();
        let org = Uuid::new_v4();
        let project = Uuid::new_v4();
        let created = repo.create(new_attachment(org, project, "a.txt")).await.unwrap();

        assert_eq!(
            repo.delete(org, project, created.id).await.unwrap(),
            Some(created.clone())
        );
        assert_eq!(repo.delete(org, project, created.id).await.unwrap(), None);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_id_rejected() {
        let repo = InMemoryAttachmentRepository::new();
        let attachment = new_attachment(Uuid::new_v4(), Uuid::new_v4(), "a.txt");
        repo.create(attachment.clone()).await.unwrap();
        assert!(repo.create(attachment).await.is_err());
        assert_eq!(repo.len().await, 1);
    }
}
