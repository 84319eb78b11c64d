//! Reading and deleting committed attachments

use std::sync::Arc;

use pulse_core::models::Attachment;
use pulse_core::AppError;
use pulse_db::AttachmentRepository;
use pulse_storage::{StagingStore, StorageError};
use uuid::Uuid;

#[derive(Clone)]
pub struct AttachmentService {
    store: Arc<dyn StagingStore>,
    attachments: Arc<dyn AttachmentRepository>,
}

impl AttachmentService {
    pub fn new(store: Arc<dyn StagingStore>, attachments: Arc<dyn AttachmentRepository>) -> Self {
        Self { store, attachments }
    }

    pub async fn list(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<Attachment>, AppError> {
        self.attachments
            .list_by_project(organization_id, project_id)
            .await
    }

    pub async fn get(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Attachment, AppError> {
        self.attachments
            .get(organization_id, project_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))
    }

    /// Delete an attachment's row and bytes together.
    ///
    /// The bytes are first retracted into staging, then the row is deleted.
    /// If the row delete fails the bytes are promoted back to their key, so
    /// either both remain or neither does. Runs detached from the caller.
    pub async fn delete(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Attachment, AppError> {
        let attachment = self.get(organization_id, project_id, id).await?;
        let store = Arc::clone(&self.store);
        let attachments = Arc::clone(&self.attachments);

        let task = tokio::spawn(async move {
            let storage_ref = attachment.storage_ref.clone();
            let retracted = match store.retract(&storage_ref).await {
                Ok(token) => Some(token),
                Err(StorageError::NotFound(_)) => {
                    tracing::warn!(
                        attachment_id = %id,
                        storage_ref = %storage_ref,
                        "Stored bytes already missing, deleting row only"
                    );
                    None
                }
                Err(e) => return Err(AppError::from(e)),
            };

            match attachments.delete(organization_id, project_id, id).await {
                Ok(deleted) => {
                    if let Some(token) = retracted {
                        if let Err(e) = store.discard(token).await {
                            tracing::error!(token = %token, error = %e, "Failed to discard retracted bytes");
                        }
                    }
                    deleted.ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))
                }
                Err(e) => {
                    if let Some(token) = retracted {
                        if let Err(restore_err) = store.promote(token, &storage_ref).await {
                            tracing::error!(
                                attachment_id = %id,
                                storage_ref = %storage_ref,
                                error = %restore_err,
                                "Failed to restore bytes after row delete failure"
                            );
                        }
                    }
                    Err(e)
                }
            }
        });

        let deleted = task
            .await
            .map_err(|e| AppError::Internal(format!("delete task failed: {}", e)))??;

        tracing::info!(attachment_id = %deleted.id, project_id = %project_id, "Attachment deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::models::NewAttachment;
    use pulse_db::InMemoryAttachmentRepository;
    use pulse_storage::{attachment_key, LocalStagingStore};
    use tempfile::tempdir;

    struct RefusingDelete(InMemoryAttachmentRepository);

    #[async_trait::async_trait]
    impl AttachmentRepository for RefusingDelete {
        async fn create(&self, attachment: NewAttachment) -> Result<Attachment, AppError> {
            self.0.create(attachment).await
        }

        async fn list_by_project(&self, org: Uuid, project: Uuid) -> Result<Vec<Attachment>, AppError> {
            self.0.list_by_project(org, project).await
        }

        async fn get(&self, org: Uuid, project: Uuid, id: Uuid) -> Result<Option<Attachment>, AppError> {
            self.0.get(org, project, id).await
        }

        async fn delete(&self, _: Uuid, _: Uuid, _: Uuid) -> Result<Option<Attachment>, AppError> {
            Err(AppError::Internal("connection reset".to_string()))
        }
    }

    async fn seed(
        store: &Arc<dyn StagingStore>,
        repo: &dyn AttachmentRepository,
    ) -> Attachment {
        let org = Uuid::new_v4();
        let project = Uuid::new_v4();
        let id = Uuid::new_v4();
        let token = store.allocate();
        let mut body: &[u8] = b"quarterly numbers";
        let staged = store.stage(token, &mut body).await.unwrap();
        let key = attachment_key(org, project, id);
        store.promote(token, &key).await.unwrap();
        repo.create(NewAttachment {
            id,
            project_id: project,
            organization_id: org,
            original_filename: "numbers.csv".to_string(),
            media_type: "text/csv".to_string(),
            size_bytes: staged.bytes_written,
            checksum_sha256: staged.checksum_sha256,
            storage_ref: key,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn delete_removes_row_and_bytes() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn StagingStore> = Arc::new(LocalStagingStore::new(dir.path()).await.unwrap());
        let repo = InMemoryAttachmentRepository::new();
        let attachment = seed(&store, &repo).await;
        let service = AttachmentService::new(Arc::clone(&store), Arc::new(repo.clone()));

        let deleted = service
            .delete(attachment.organization_id, attachment.project_id, attachment.id)
            .await
            .unwrap();
        assert_eq!(deleted.id, attachment.id);
        assert!(repo.is_empty().await);
        assert!(matches!(
            store.read(&attachment.storage_ref).await,
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(store.staged_count().await.unwrap(), 0);

        let again = service
            .delete(attachment.organization_id, attachment.project_id, attachment.id)
            .await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_row_delete_restores_bytes() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn StagingStore> = Arc::new(LocalStagingStore::new(dir.path()).await.unwrap());
        let inner = InMemoryAttachmentRepository::new();
        let attachment = seed(&store, &inner).await;
        let service = AttachmentService::new(Arc::clone(&store), Arc::new(RefusingDelete(inner.clone())));

        let result = service
            .delete(attachment.organization_id, attachment.project_id, attachment.id)
            .await;
        assert!(result.is_err());
        assert_eq!(inner.len().await, 1);
        assert_eq!(
            store.read(&attachment.storage_ref).await.unwrap().as_ref(),
            b"quarterly numbers"
        );
        assert_eq!(store.staged_count().await.unwrap(), 0);
    }
}
