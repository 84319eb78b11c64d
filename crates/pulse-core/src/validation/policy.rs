use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::content_type::{expected_content_types, extension_of, is_executable, normalize_media_type};
use super::filename::clean_filename;
use crate::config::AttachmentLimits;

const PE_MAGIC: &[u8] = b"MZ";
const ELF_MAGIC: &[u8] = b"\x7fELF";

/// Why an upload was refused. The string form is the stable reason code
/// returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooLarge,
    InvalidType,
    InvalidFilename,
    EmptyFile,
    ScanFailed,
    StorageError,
    Aborted,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::TooLarge => "too_large",
            RejectReason::InvalidType => "invalid_type",
            RejectReason::InvalidFilename => "invalid_filename",
            RejectReason::EmptyFile => "empty_file",
            RejectReason::ScanFailed => "scan_failed",
            RejectReason::StorageError => "storage_error",
            RejectReason::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of a static policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason, String),
}

impl Verdict {
    fn reject(reason: RejectReason, detail: impl Into<String>) -> Self {
        Verdict::Reject(reason, detail.into())
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Result of the running size check made while the body streams in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    Continue,
    Abort,
}

/// Upload constraints. Pure: no I/O, no shared state.
#[derive(Debug, Clone)]
pub struct ConstraintPolicy {
    limits: AttachmentLimits,
}

impl ConstraintPolicy {
    pub fn new(limits: AttachmentLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &AttachmentLimits {
        &self.limits
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.limits.max_size_bytes
    }

    /// Called after every chunk with the running total. The ceiling itself is
    /// allowed; one byte past it aborts.
    pub fn check_size_so_far(&self, bytes_consumed: u64) -> SizeCheck {
        if bytes_consumed > self.limits.max_size_bytes {
            SizeCheck::Abort
        } else {
            SizeCheck::Continue
        }
    }

    /// Evaluate the declared metadata of a fully received upload.
    ///
    /// Checks run in order: size ceiling, empty body, filename, then type
    /// (executable blocklist, content-type allow-list, extension allow-list,
    /// extension/type agreement).
    pub fn evaluate(&self, declared_media_type: &str, declared_size: u64, filename: &str) -> Verdict {
        if let SizeCheck::Abort = self.check_size_so_far(declared_size) {
            return Verdict::reject(
                RejectReason::TooLarge,
                format!(
                    "{} bytes exceeds the limit of {} bytes",
                    declared_size, self.limits.max_size_bytes
                ),
            );
        }

        if declared_size == 0 {
            return Verdict::reject(RejectReason::EmptyFile, "file has no content");
        }

        // Type checks read the untruncated name.
        let filename = match clean_filename(filename) {
            Ok(name) => name,
            Err(detail) => return Verdict::reject(RejectReason::InvalidFilename, detail),
        };

        let media_type = normalize_media_type(declared_media_type);
        let extension = extension_of(&filename);

        if is_executable(&media_type, extension.as_deref()) {
            return Verdict::reject(RejectReason::InvalidType, "executable files are not allowed");
        }

        if !self.limits.allowed_content_types.iter().any(|t| *t == media_type) {
            return Verdict::reject(
                RejectReason::InvalidType,
                format!("content type '{}' is not allowed", media_type),
            );
        }

        let Some(extension) = extension else {
            return Verdict::reject(RejectReason::InvalidType, "file must have an extension");
        };

        if !self.limits.allowed_extensions.contains(&extension) {
            return Verdict::reject(
                RejectReason::InvalidType,
                format!("extension '{}' is not allowed", extension),
            );
        }

        if let Some(expected) = expected_content_types(&extension) {
            if !expected.contains(&media_type.as_str()) {
                return Verdict::reject(
                    RejectReason::InvalidType,
                    format!(
                        "content type '{}' does not match extension '{}'",
                        media_type, extension
                    ),
                );
            }
        }

        Verdict::Accept
    }

    /// Inspect the leading bytes of staged content. Always accepts when
    /// sniffing is disabled.
    pub fn sniff(&self, head: &[u8]) -> Verdict {
        if !self.limits.content_sniffing_enabled {
            return Verdict::Accept;
        }
        if head.starts_with(PE_MAGIC) || head.starts_with(ELF_MAGIC) {
            return Verdict::reject(
                RejectReason::InvalidType,
                "content is an executable image",
            );
        }
        Verdict::Accept
    }
}
