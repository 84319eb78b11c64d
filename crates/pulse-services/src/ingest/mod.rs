//! Ingestion orchestrator
//!
//! Drives one upload through `Receiving -> Validating -> Scanning ->
//! Committing -> Done`. Any stage may end the run as `Rejected`; every
//! rejection discards the staging entry before it is returned, so a rejected
//! upload leaves neither bytes nor a row behind.

mod lease;
mod state;

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use pulse_core::models::{Attachment, NewAttachment};
use pulse_core::validation::{normalize_media_type, sanitize_filename};
use pulse_core::{ConstraintPolicy, RejectReason, SizeCheck, Verdict};
use pulse_db::AttachmentRepository;
use pulse_storage::{attachment_key, StagedFile, StagingStore, StagingToken, StorageError};
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::scanner::{ScanVerdict, ScannerAdapter};
use lease::StagingLease;

pub use state::{IngestOutcome, IngestState, Rejection};

/// Error carried inside an `io::Error` when the body outgrows the ceiling.
/// The HTTP layer raises it too when its own body limit trips.
#[derive(Debug, thiserror::Error)]
#[error("upload exceeds the size limit")]
pub struct SizeLimitExceeded;

impl SizeLimitExceeded {
    pub fn into_io_error(self) -> io::Error {
        io::Error::other(self)
    }

    fn is_cause_of(err: &io::Error) -> bool {
        err.get_ref()
            .is_some_and(|inner| inner.is::<SizeLimitExceeded>())
    }
}

/// Declared metadata of one upload.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub organization_id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub declared_media_type: String,
}

/// Per-run bookkeeping: current state and bytes seen so far.
struct Run {
    token: StagingToken,
    state: IngestState,
    bytes_received: u64,
    limit_bytes: u64,
}

impl Run {
    fn advance(&mut self, next: IngestState) {
        tracing::debug!(
            upload_id = %self.token,
            from = %self.state,
            to = %next,
            "Ingest state transition"
        );
        self.state = next;
    }

    fn rejection(&self, reason: RejectReason, detail: impl Into<String>) -> Rejection {
        Rejection {
            reason,
            state: self.state,
            detail: detail.into(),
            bytes_received: self.bytes_received,
            limit_bytes: self.limit_bytes,
        }
    }
}

#[derive(Clone)]
pub struct IngestionOrchestrator {
    policy: Arc<ConstraintPolicy>,
    store: Arc<dyn StagingStore>,
    scanner: ScannerAdapter,
    attachments: Arc<dyn AttachmentRepository>,
}

impl IngestionOrchestrator {
    pub fn new(
        policy: Arc<ConstraintPolicy>,
        store: Arc<dyn StagingStore>,
        scanner: ScannerAdapter,
        attachments: Arc<dyn AttachmentRepository>,
    ) -> Self {
        Self {
            policy,
            store,
            scanner,
            attachments,
        }
    }

    pub fn policy(&self) -> &ConstraintPolicy {
        &self.policy
    }

    pub fn scanner(&self) -> &ScannerAdapter {
        &self.scanner
    }

    /// Run one upload to its terminal outcome.
    ///
    /// `body` is consumed only as far as the size ceiling allows. Dropping
    /// the returned future before it completes discards the staging entry;
    /// once the run reaches `Committing` the commit finishes in its own task.
    #[tracing::instrument(skip_all, fields(
        organization_id = %request.organization_id,
        project_id = %request.project_id,
        upload_id = tracing::field::Empty,
    ))]
    pub async fn ingest<S>(&self, request: IngestRequest, body: S) -> IngestOutcome
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send,
    {
        let lease = StagingLease::new(Arc::clone(&self.store), self.store.allocate());
        tracing::Span::current().record("upload_id", tracing::field::display(lease.token()));

        let mut run = Run {
            token: lease.token(),
            state: IngestState::Receiving,
            bytes_received: 0,
            limit_bytes: self.policy.max_size_bytes(),
        };

        // Receiving
        let staged = match self.receive(&mut run, body).await {
            Ok(staged) => staged,
            Err(rejection) => return self.reject(&mut run, lease, rejection).await,
        };
        run.bytes_received = staged.bytes_written;

        // Validating
        run.advance(IngestState::Validating);
        if let Verdict::Reject(reason, detail) = self.policy.evaluate(
            &request.declared_media_type,
            staged.bytes_written,
            &request.filename,
        ) {
            let rejection = run.rejection(reason, detail);
            return self.reject(&mut run, lease, rejection).await;
        }
        let filename = match sanitize_filename(&request.filename) {
            Ok(name) => name,
            Err(detail) => {
                let rejection = run.rejection(RejectReason::InvalidFilename, detail);
                return self.reject(&mut run, lease, rejection).await;
            }
        };
        let content = match self.store.read_staged(lease.token()).await {
            Ok(content) => content,
            Err(e) => {
                let rejection = run.rejection(RejectReason::StorageError, e.to_string());
                return self.reject(&mut run, lease, rejection).await;
            }
        };
        if let Verdict::Reject(reason, detail) = self.policy.sniff(&content) {
            let rejection = run.rejection(reason, detail);
            return self.reject(&mut run, lease, rejection).await;
        }

        // Scanning
        run.advance(IngestState::Scanning);
        let detail = match self.scanner.scan(content).await {
            ScanVerdict::Clean => None,
            ScanVerdict::Infected(signature) => Some(format!("malware detected: {}", signature)),
            ScanVerdict::Error(error) => Some(format!("scan could not complete: {}", error)),
        };
        if let Some(detail) = detail {
            let rejection = run.rejection(RejectReason::ScanFailed, detail);
            return self.reject(&mut run, lease, rejection).await;
        }

        // Committing
        run.advance(IngestState::Committing);
        let id = Uuid::new_v4();
        let key = attachment_key(request.organization_id, request.project_id, id);
        let job = CommitJob {
            id,
            key: key.clone(),
            store: Arc::clone(&self.store),
            attachments: Arc::clone(&self.attachments),
            token: lease.release(),
            organization_id: request.organization_id,
            project_id: request.project_id,
            original_filename: filename,
            media_type: normalize_media_type(&request.declared_media_type),
            staged,
        };
        let token = job.token;

        match tokio::spawn(job.run()).await {
            Ok(Ok(attachment)) => {
                run.advance(IngestState::Done);
                tracing::info!(
                    attachment_id = %attachment.id,
                    size_bytes = attachment.size_bytes,
                    media_type = %attachment.media_type,
                    "Attachment committed"
                );
                IngestOutcome::Committed(attachment)
            }
            Ok(Err(detail)) => {
                let rejection = run.rejection(RejectReason::StorageError, detail);
                self.finish_rejected(&mut run, rejection)
            }
            Err(e) => {
                tracing::error!(error = %e, "Commit task failed");
                // The task may have died on either side of promotion.
                if let Err(e) = self.store.discard(token).await {
                    tracing::error!(token = %token, error = %e, "Failed to discard staging entry");
                }
                if let Err(e) = self.store.remove(&key).await {
                    tracing::error!(key = %key, error = %e, "Failed to remove promoted bytes");
                }
                let rejection = run.rejection(RejectReason::StorageError, e.to_string());
                self.finish_rejected(&mut run, rejection)
            }
        }
    }

    /// Stream the body into staging behind the size guard.
    async fn receive<S>(&self, run: &mut Run, body: S) -> Result<StagedFile, Rejection>
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send,
    {
        let consumed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&consumed);
        let policy = Arc::clone(&self.policy);

        let guarded = body.map(move |chunk| {
            let chunk = chunk?;
            let len = chunk.len() as u64;
            let total = counter.fetch_add(len, Ordering::SeqCst) + len;
            match policy.check_size_so_far(total) {
                SizeCheck::Continue => Ok(chunk),
                SizeCheck::Abort => Err(SizeLimitExceeded.into_io_error()),
            }
        });
        let mut reader = StreamReader::new(Box::pin(guarded));

        let result = self.store.stage(run.token, &mut reader).await;
        run.bytes_received = consumed.load(Ordering::SeqCst);

        result.map_err(|e| match e {
            StorageError::SourceInterrupted(io_err) if SizeLimitExceeded::is_cause_of(&io_err) => {
                run.rejection(
                    RejectReason::TooLarge,
                    format!("upload exceeds the limit of {} bytes", run.limit_bytes),
                )
            }
            StorageError::SourceInterrupted(io_err) => {
                run.rejection(RejectReason::Aborted, io_err.to_string())
            }
            other => run.rejection(RejectReason::StorageError, other.to_string()),
        })
    }

    async fn reject(&self, run: &mut Run, lease: StagingLease, rejection: Rejection) -> IngestOutcome {
        lease.discard().await;
        self.finish_rejected(run, rejection)
    }

    fn finish_rejected(&self, run: &mut Run, rejection: Rejection) -> IngestOutcome {
        run.advance(IngestState::Rejected);
        if rejection.reason == RejectReason::StorageError {
            tracing::error!(
                reason = %rejection.reason,
                stage = %rejection.state,
                detail = %rejection.detail,
                "Upload rejected"
            );
        } else {
            tracing::info!(
                reason = %rejection.reason,
                stage = %rejection.state,
                detail = %rejection.detail,
                bytes_received = rejection.bytes_received,
                "Upload rejected"
            );
        }
        IngestOutcome::Rejected(rejection)
    }
}

/// The commit step. Runs detached so a cancelled request cannot stop it
/// between promotion and the repository insert.
struct CommitJob {
    store: Arc<dyn StagingStore>,
    attachments: Arc<dyn AttachmentRepository>,
    token: StagingToken,
    id: Uuid,
    key: String,
    organization_id: Uuid,
    project_id: Uuid,
    original_filename: String,
    media_type: String,
    staged: StagedFile,
}

impl CommitJob {
    async fn run(self) -> Result<Attachment, String> {
        let storage_ref = match self.store.promote(self.token, &self.key).await {
            Ok(storage_ref) => storage_ref,
            Err(e) => {
                if let Err(discard_err) = self.store.discard(self.token).await {
                    tracing::error!(token = %self.token, error = %discard_err, "Failed to discard staging entry");
                }
                return Err(format!("promote failed: {}", e));
            }
        };

        let new_attachment = NewAttachment {
            id: self.id,
            project_id: self.project_id,
            organization_id: self.organization_id,
            original_filename: self.original_filename,
            media_type: self.media_type,
            size_bytes: self.staged.bytes_written,
            checksum_sha256: self.staged.checksum_sha256,
            storage_ref: storage_ref.clone(),
        };

        match self.attachments.create(new_attachment).await {
            Ok(attachment) => Ok(attachment),
            Err(e) => {
                // Compensate: the bytes must not outlive the failed insert.
                if let Err(remove_err) = self.store.remove(&storage_ref).await {
                    tracing::error!(
                        storage_ref = %storage_ref,
                        error = %remove_err,
                        "Failed to remove promoted bytes after insert failure"
                    );
                }
                Err(format!("failed to record attachment: {}", e))
            }
        }
    }
}
