//! Shared key generation for stored attachments.

use uuid::Uuid;

/// Storage key of a committed attachment.
pub fn attachment_key(organization_id: Uuid, project_id: Uuid, attachment_id: Uuid) -> String {
    format!(
        "attachments/{}/{}/{}",
        organization_id, project_id, attachment_id
    )
}
