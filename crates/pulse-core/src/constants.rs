//! Shared constants.

use uuid::Uuid;

/// Organization used when the gateway does not forward an organization scope.
pub const DEFAULT_ORGANIZATION_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

/// Default attachment size ceiling (5 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Longest sanitized filename we keep.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Multipart framing allowance added on top of the attachment ceiling when
/// sizing the request body limit of the upload route.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
