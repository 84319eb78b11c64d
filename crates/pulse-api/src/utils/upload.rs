//! Multipart plumbing for the upload route

use std::io;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use pulse_core::AppError;
use pulse_services::SizeLimitExceeded;

/// Name of the multipart field that carries the file
pub const FILE_FIELD: &str = "file";

/// Declared metadata of the file part
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
}

/// Translate a multipart read failure for the orchestrator. The transport
/// body limit becomes [`SizeLimitExceeded`] so it is reported as `too_large`.
pub fn multipart_io_error(err: MultipartError) -> io::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        SizeLimitExceeded.into_io_error()
    } else {
        io::Error::other(err.body_text())
    }
}

/// Read the next multipart field header. The field content is not read.
pub async fn next_field(
    multipart: &mut Multipart,
    limit_bytes: u64,
) -> Result<Option<Field<'_>>, AppError> {
    multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            // Lower bound: the transport limit tripped before the file part.
            AppError::TooLarge {
                size: limit_bytes.saturating_add(1),
                limit: limit_bytes,
            }
        } else {
            AppError::InvalidInput(format!("Failed to read multipart: {}", e.body_text()))
        }
    })
}

pub fn missing_file_field() -> AppError {
    AppError::InvalidInput(format!(
        "No file provided; send one multipart field named '{}'",
        FILE_FIELD
    ))
}

/// Split a file field into its declared metadata and its byte stream.
///
/// A missing filename stays empty and is refused by the filename check; a
/// missing content type falls back to `application/octet-stream`.
pub fn into_byte_stream(
    field: Field<'_>,
) -> (FilePart, impl Stream<Item = Result<Bytes, io::Error>> + Send + '_) {
    let part = FilePart {
        filename: field.file_name().unwrap_or_default().to_string(),
        content_type: field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string(),
    };
    (part, field.map_err(multipart_io_error))
}
