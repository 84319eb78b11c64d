use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::traits::{StagedFile, StagingStore, StagingToken, StorageError, StorageResult};

const STAGING_DIR: &str = ".staging";
const STAGING_SUFFIX: &str = "part";
const CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem staging store
///
/// Staging entries live in `<root>/.staging/<token>.part`; promoted content
/// lives at `<root>/<key>`. Both are on the same filesystem, so promotion is
/// a single `rename`.
#[derive(Clone)]
pub struct LocalStagingStore {
    base_path: PathBuf,
    staging_path: PathBuf,
}

impl LocalStagingStore {
    /// Create a new store rooted at `base_path`, creating the root and the
    /// staging directory if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        let staging_path = base_path.join(STAGING_DIR);

        fs::create_dir_all(&staging_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                staging_path.display(),
                e
            ))
        })?;

        Ok(LocalStagingStore {
            base_path,
            staging_path,
        })
    }

    fn staged_file(&self, token: StagingToken) -> PathBuf {
        self.staging_path
            .join(format!("{}.{}", token, STAGING_SUFFIX))
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.starts_with('/')
            || storage_key.contains('\\')
            || storage_key.contains('\0')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        if storage_key.starts_with('.') {
            return Err(StorageError::InvalidKey(
                "Storage key must not address the staging area".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);
        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn remove_if_present(path: &Path) -> std::io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StagingStore for LocalStagingStore {
    fn allocate(&self) -> StagingToken {
        StagingToken::new()
    }

    async fn stage(
        &self,
        token: StagingToken,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<StagedFile> {
        let path = self.staged_file(token);
        let start = Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create staging file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut bytes_written: u64 = 0;

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(StorageError::SourceInterrupted)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n]).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write staging file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            bytes_written += n as u64;
        }

        file.flush().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to flush staging file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(
            token = %token,
            size_bytes = bytes_written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Staged upload"
        );

        Ok(StagedFile {
            token,
            bytes_written,
            checksum_sha256: hex::encode(hasher.finalize()),
        })
    }

    async fn read_staged(&self, token: StagingToken) -> StorageResult<Bytes> {
        let path = self.staged_file(token);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("staging entry {}", token)))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read staging file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn promote(&self, token: StagingToken, key: &str) -> StorageResult<String> {
        let target = self.key_to_path(key)?;
        let source = self.staged_file(token);
        let start = Instant::now();

        let file = match fs::File::open(&source).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("staging entry {}", token)))
            }
            Err(e) => return Err(StorageError::PromoteFailed(e.to_string())),
        };
        file.sync_all().await.map_err(|e| {
            StorageError::PromoteFailed(format!("Failed to sync {}: {}", source.display(), e))
        })?;
        drop(file);

        if fs::try_exists(&target).await.unwrap_or(false) {
            return Err(StorageError::PromoteFailed(format!(
                "Storage key already in use: {}",
                key
            )));
        }

        self.ensure_parent_dir(&target).await?;

        fs::rename(&source, &target).await.map_err(|e| {
            StorageError::PromoteFailed(format!(
                "Failed to move {} to {}: {}",
                source.display(),
                target.display(),
                e
            ))
        })?;

        tracing::info!(
            token = %token,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Promoted staged upload"
        );

        Ok(key.to_string())
    }

    async fn discard(&self, token: StagingToken) -> StorageResult<()> {
        let path = self.staged_file(token);
        let removed = Self::remove_if_present(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!(
                "Failed to discard staging file {}: {}",
                path.display(),
                e
            ))
        })?;

        if removed {
            tracing::debug!(token = %token, "Discarded staging entry");
        }
        Ok(())
    }

    async fn read(&self, storage_ref: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(storage_ref)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_ref.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn content_length(&self, storage_ref: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_ref)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_ref.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn remove(&self, storage_ref: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_ref)?;
        let removed = Self::remove_if_present(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        if removed {
            tracing::info!(key = %storage_ref, "Removed stored attachment");
        }
        Ok(())
    }

    async fn retract(&self, storage_ref: &str) -> StorageResult<StagingToken> {
        let source = self.key_to_path(storage_ref)?;
        let token = self.allocate();
        let target = self.staged_file(token);

        match fs::rename(&source, &target).await {
            Ok(()) => {
                tracing::debug!(key = %storage_ref, token = %token, "Retracted stored attachment");
                Ok(token)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_ref.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to retract {}: {}",
                source.display(),
                e
            ))),
        }
    }

    async fn staged_count(&self) -> StorageResult<usize> {
        let mut entries = fs::read_dir(&self.staging_path).await?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(|e| e.to_str()) == Some(STAGING_SUFFIX) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn sweep_stale(&self, max_age: Duration) -> StorageResult<usize> {
        let now = SystemTime::now();
        let mut entries = fs::read_dir(&self.staging_path).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STAGING_SUFFIX) {
                continue;
            }
            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot stat staging entry");
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age >= max_age && Self::remove_if_present(&path).await? {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Swept stale staging entries");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use uuid::Uuid;

    async fn store() -> (tempfile::TempDir, LocalStagingStore) {
        let dir = tempdir().unwrap();
        let store = LocalStagingStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    fn key() -> String {
        crate::keys::attachment_key(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[tokio::test]
    async fn stage_promote_read() {
        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut body: &[u8] = b"hello attachment";

        let staged = store.stage(token, &mut body).await.unwrap();
        assert_eq!(staged.bytes_written, 16);
        assert_eq!(
            staged.checksum_sha256,
            hex::encode(Sha256::digest(b"hello attachment"))
        );
        assert_eq!(store.staged_count().await.unwrap(), 1);
        assert_eq!(
            store.read_staged(token).await.unwrap(),
            Bytes::from_static(b"hello attachment")
        );

        let key = key();
        let storage_ref = store.promote(token, &key).await.unwrap();
        assert_eq!(storage_ref, key);
        assert_eq!(store.staged_count().await.unwrap(), 0);
        assert_eq!(store.read(&storage_ref).await.unwrap().as_ref(), b"hello attachment");
        assert_eq!(store.content_length(&storage_ref).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn staging_is_not_readable_by_key() {
        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut body: &[u8] = b"secret";
        store.stage(token, &mut body).await.unwrap();

        let staged_key = format!(".staging/{}.part", token);
        assert!(matches!(
            store.read(&staged_key).await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn token_cannot_be_staged_twice() {
        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut first: &[u8] = b"one";
        let mut second: &[u8] = b"two";
        store.stage(token, &mut first).await.unwrap();
        assert!(matches!(
            store.stage(token, &mut second).await,
            Err(StorageError::UploadFailed(_))
        ));
    }

    #[tokio::test]
    async fn discard_is_idempotent() {
        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut body: &[u8] = b"data";
        store.stage(token, &mut body).await.unwrap();

        store.discard(token).await.unwrap();
        store.discard(token).await.unwrap();
        store.discard(store.allocate()).await.unwrap();
        assert_eq!(store.staged_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn promote_missing_entry_fails() {
        let (_dir, store) = store().await;
        let result = store.promote(store.allocate(), &key()).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_dir, store) = store().await;
        for bad in ["../escape", "/etc/passwd", "a/../../b", "", ".staging/x.part"] {
            assert!(
                matches!(store.read(bad).await, Err(StorageError::InvalidKey(_))),
                "{}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn retract_and_promote_back() {
        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut body: &[u8] = b"keep me";
        store.stage(token, &mut body).await.unwrap();
        let key = key();
        store.promote(token, &key).await.unwrap();

        let retracted = store.retract(&key).await.unwrap();
        assert!(matches!(store.read(&key).await, Err(StorageError::NotFound(_))));
        assert_eq!(store.staged_count().await.unwrap(), 1);

        store.promote(retracted, &key).await.unwrap();
        assert_eq!(store.read(&key).await.unwrap().as_ref(), b"keep me");
        assert_eq!(store.staged_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut body: &[u8] = b"bytes";
        store.stage(token, &mut body).await.unwrap();
        let key = key();
        store.promote(token, &key).await.unwrap();

        store.remove(&key).await.unwrap();
        store.remove(&key).await.unwrap();
        assert!(matches!(store.read(&key).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn source_error_is_reported_as_interrupted() {
        struct Broken;
        impl AsyncRead for Broken {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::new(
                    ErrorKind::ConnectionReset,
                    "client went away",
                )))
            }
        }

        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut reader = Broken;
        let result = store.stage(token, &mut reader).await;
        assert!(matches!(result, Err(StorageError::SourceInterrupted(_))));

        store.discard(token).await.unwrap();
        assert_eq!(store.staged_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_entries() {
        let (_dir, store) = store().await;
        let token = store.allocate();
        let mut body: &[u8] = b"old";
        store.stage(token, &mut body).await.unwrap();

        assert_eq!(store.sweep_stale(Duration::from_secs(3600)).await.unwrap(), 0);
        assert_eq!(store.staged_count().await.unwrap(), 1);

        assert_eq!(store.sweep_stale(Duration::ZERO).await.unwrap(), 1);
        assert_eq!(store.staged_count().await.unwrap(), 0);
    }
}
