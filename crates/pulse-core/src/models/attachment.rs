use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a stored attachment.
///
/// Only committed attachments are ever persisted or returned; the enum exists
/// so the stored column and the API field stay explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    Committed,
}

impl AttachmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentStatus::Committed => "committed",
        }
    }
}

impl fmt::Display for AttachmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "committed" => Ok(AttachmentStatus::Committed),
            other => Err(format!("unknown attachment status: {}", other)),
        }
    }
}

/// A committed attachment: its bytes passed every constraint and the content
/// scan and are durably stored at `storage_ref`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub original_filename: String,
    pub media_type: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the stored bytes
    pub checksum_sha256: String,
    /// Opaque storage key, never a filesystem path
    pub storage_ref: String,
    pub status: AttachmentStatus,
    pub created_at: DateTime<Utc>,
}

/// Everything the orchestrator knows about an attachment before the
/// repository assigns its creation time.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub original_filename: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub checksum_sha256: String,
    pub storage_ref: String,
}

impl NewAttachment {
    pub fn into_attachment(self, created_at: DateTime<Utc>) -> Attachment {
        Attachment {
            id: self.id,
            project_id: self.project_id,
            organization_id: self.organization_id,
            original_filename: self.original_filename,
            media_type: self.media_type,
            size_bytes: self.size_bytes,
            checksum_sha256: self.checksum_sha256,
            storage_ref: self.storage_ref,
            status: AttachmentStatus::Committed,
            created_at,
        }
    }
}
