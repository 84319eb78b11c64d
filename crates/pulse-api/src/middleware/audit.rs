//! Attachment audit logging
//!
//! Structured entries under the `audit` target for every upload outcome and
//! every deletion, consumed by the consent-audit collector.

use pulse_core::models::Attachment;
use pulse_services::Rejection;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::OrgContext;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AttachmentCommitted,
    AttachmentRejected,
    AttachmentDeleted,
}

/// Structured audit log entry
#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    pub organization_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub project_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub success: bool,
}

impl AuditLogEntry {
    fn new(event_type: AuditEventType, ctx: &OrgContext, project_id: Uuid) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            event_type,
            organization_id: ctx.organization_id,
            user_id: ctx.user_id,
            project_id,
            attachment_id: None,
            details: None,
            success: true,
        }
    }

    fn with_attachment_id(mut self, attachment_id: Uuid) -> Self {
        self.attachment_id = Some(attachment_id);
        self
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn with_failure(mut self) -> Self {
        self.success = false;
        self
    }

    /// Log the audit entry under the `audit` target
    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        if self.success {
            tracing::event!(
                target: "audit",
                tracing::Level::INFO,
                audit_entry = %json,
                event_type = ?self.event_type,
                organization_id = %self.organization_id,
                attachment_id = ?self.attachment_id,
                "Attachment audit log"
            );
        } else {
            tracing::event!(
                target: "audit",
                tracing::Level::WARN,
                audit_entry = %json,
                event_type = ?self.event_type,
                organization_id = %self.organization_id,
                "Attachment audit log - rejected"
            );
        }
    }
}

pub fn log_attachment_committed(ctx: &OrgContext, attachment: &Attachment) {
    AuditLogEntry::new(AuditEventType::AttachmentCommitted, ctx, attachment.project_id)
        .with_attachment_id(attachment.id)
        .with_details(serde_json::json!({
            "filename": attachment.original_filename,
            "media_type": attachment.media_type,
            "size_bytes": attachment.size_bytes,
            "checksum_sha256": attachment.checksum_sha256,
        }))
        .log();
}

pub fn log_attachment_rejected(ctx: &OrgContext, project_id: Uuid, rejection: &Rejection) {
    AuditLogEntry::new(AuditEventType::AttachmentRejected, ctx, project_id)
        .with_details(serde_json::json!({
            "reason": rejection.reason,
            "stage": rejection.state.as_str(),
            "bytes_received": rejection.bytes_received,
        }))
        .with_failure()
        .log();
}

pub fn log_attachment_deleted(ctx: &OrgContext, attachment: &Attachment) {
    AuditLogEntry::new(AuditEventType::AttachmentDeleted, ctx, attachment.project_id)
        .with_attachment_id(attachment.id)
        .with_details(serde_json::json!({
            "filename": attachment.original_filename,
        }))
        .log();
}
