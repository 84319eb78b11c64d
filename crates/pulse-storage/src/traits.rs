//! Staging store abstraction
//!
//! This module defines the [`StagingStore`] trait used by the ingestion
//! pipeline. Bytes enter the store through a staging entry that no read API
//! can reach, and leave it either by promotion to a storage key or by
//! discard.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The byte source (the client body) failed while being staged.
    #[error("Upload source interrupted: {0}")]
    SourceInterrupted(#[source] std::io::Error),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Promote failed: {0}")]
    PromoteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for pulse_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SourceInterrupted(e) => pulse_core::AppError::UploadAborted(e.to_string()),
            other => pulse_core::AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One-time handle to a staging entry. Every upload allocates a fresh token;
/// tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingToken(Uuid);

impl StagingToken {
    pub fn new() -> Self {
        StagingToken(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StagingToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StagingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of a completed `stage` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub token: StagingToken,
    pub bytes_written: u64,
    /// Hex-encoded SHA-256 of the staged bytes
    pub checksum_sha256: String,
}

/// Staging store trait
///
/// Implementations must be safe for concurrent, independent use: distinct
/// tokens never share state.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Allocate a fresh staging token. No file exists until `stage`.
    fn allocate(&self) -> StagingToken;

    /// Stream `reader` to EOF into the staging entry for `token`.
    ///
    /// Fails if an entry already exists for the token. A read failure on the
    /// source is reported as [`StorageError::SourceInterrupted`].
    async fn stage(
        &self,
        token: StagingToken,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<StagedFile>;

    /// Read the full content of a staging entry.
    async fn read_staged(&self, token: StagingToken) -> StorageResult<Bytes>;

    /// Atomically move a staging entry to `key`. Returns the storage ref.
    async fn promote(&self, token: StagingToken, key: &str) -> StorageResult<String>;

    /// Delete a staging entry. Deleting an absent entry succeeds.
    async fn discard(&self, token: StagingToken) -> StorageResult<()>;

    /// Read promoted content.
    async fn read(&self, storage_ref: &str) -> StorageResult<Bytes>;

    /// Size in bytes of promoted content.
    async fn content_length(&self, storage_ref: &str) -> StorageResult<u64>;

    /// Delete promoted content. Deleting an absent object succeeds.
    async fn remove(&self, storage_ref: &str) -> StorageResult<()>;

    /// Atomically move promoted content back into a new staging entry.
    async fn retract(&self, storage_ref: &str) -> StorageResult<StagingToken>;

    /// Number of staging entries currently present.
    async fn staged_count(&self) -> StorageResult<usize>;

    /// Delete staging entries last modified more than `max_age` ago.
    /// Returns how many were removed.
    async fn sweep_stale(&self, max_age: Duration) -> StorageResult<usize>;
}
