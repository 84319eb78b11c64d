//! Error types module
//!
//! All failures of the attachment pipeline are unified under [`AppError`]. The
//! first group of variants are expected, user-facing outcomes of an upload
//! (size, type, scan, missing project); the second group implicates the
//! service's own infrastructure.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// Errors self-describe their HTTP response characteristics through this trait.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Stable, machine-readable reason code (e.g. "too_large")
    fn error_code(&self) -> &'static str;

    /// Whether the client may retry the same request unchanged
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File too large: {size} bytes received, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Invalid file type: {0}")]
    InvalidType(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("Scan failed: {0}")]
    ScanFailed(String),

    #[error("Upload aborted: {0}")]
    UploadAborted(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::TooLarge { .. } => (
            400,
            "too_large",
            false,
            Some("Reduce the file size below the configured limit"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidType(_) => (
            400,
            "invalid_type",
            false,
            Some("Upload an allowed file type whose extension matches its Content-Type"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidFilename(_) => (
            400,
            "invalid_filename",
            false,
            Some("Rename the file and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::EmptyFile => (
            400,
            "empty_file",
            false,
            Some("Upload a non-empty file"),
            false,
            LogLevel::Debug,
        ),
        AppError::ScanFailed(_) => (
            400,
            "scan_failed",
            false,
            Some("The file did not pass malware screening"),
            false,
            LogLevel::Warn,
        ),
        AppError::UploadAborted(_) => (
            400,
            "aborted",
            true,
            Some("Retry the upload"),
            false,
            LogLevel::Debug,
        ),
        AppError::ProjectNotFound(_) => (
            404,
            "project_not_found",
            false,
            Some("Verify the project ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "not_found",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "invalid_input",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Storage(_) => (
            500,
            "storage_error",
            true,
            Some("Retry the upload after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Database(_) => (
            500,
            "database_error",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "internal_error",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::TooLarge { limit, .. } => {
                format!("File exceeds the maximum size of {} bytes", limit)
            }
            AppError::InvalidType(msg) => format!("File type not allowed: {}", msg),
            AppError::InvalidFilename(msg) => format!("Invalid filename: {}", msg),
            AppError::EmptyFile => "File is empty".to_string(),
            AppError::ScanFailed(_) => "File rejected by malware scan".to_string(),
            AppError::UploadAborted(_) => "Upload was interrupted before completion".to_string(),
            AppError::ProjectNotFound(id) => format!("Project {} not found", id),
            AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Storage(_) => "Failed to store attachment".to_string(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }
}

impl AppError {
    /// Variant name, used as a structured log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::TooLarge { .. } => "TooLarge",
            AppError::InvalidType(_) => "InvalidType",
            AppError::InvalidFilename(_) => "InvalidFilename",
            AppError::EmptyFile => "EmptyFile",
            AppError::ScanFailed(_) => "ScanFailed",
            AppError::UploadAborted(_) => "UploadAborted",
            AppError::ProjectNotFound(_) => "ProjectNotFound",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Storage(_) => "Storage",
            AppError::Database(_) => "Database",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "InternalWithSource",
        }
    }

    /// Full message including the source chain, for logs and non-sensitive details.
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {:#}", message, source)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_client_errors() {
        let cases = [
            AppError::TooLarge { size: 10, limit: 5 },
            AppError::InvalidType("application/x-msdownload".into()),
            AppError::InvalidFilename("empty".into()),
            AppError::EmptyFile,
            AppError::ScanFailed("Eicar-Test-Signature".into()),
        ];
        for err in cases {
            assert_eq!(err.http_status_code(), 400, "{:?}", err);
            assert!(!err.is_sensitive());
        }
    }

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(AppError::TooLarge { size: 1, limit: 0 }.error_code(), "too_large");
        assert_eq!(AppError::InvalidType(String::new()).error_code(), "invalid_type");
        assert_eq!(AppError::ScanFailed(String::new()).error_code(), "scan_failed");
        assert_eq!(AppError::Storage(String::new()).error_code(), "storage_error");
    }

    #[test]
    fn project_not_found_is_404() {
        let err = AppError::ProjectNotFound(Uuid::nil());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "project_not_found");
    }

    #[test]
    fn storage_error_hides_internals() {
        let err = AppError::Storage("rename /srv/data/.staging/x.part failed".into());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("/srv"));
    }

    #[test]
    fn internal_with_source_keeps_chain() {
        let err: AppError = anyhow::anyhow!("disk full").context("promote failed").into();
        assert_eq!(err.http_status_code(), 500);
        assert!(err.detailed_message().contains("disk full"));
        assert_eq!(err.client_message(), "An internal error occurred");
    }
}
