use std::fmt;

use pulse_core::models::Attachment;
use pulse_core::{AppError, RejectReason};

/// Stage of one upload run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Receiving,
    Validating,
    Scanning,
    Committing,
    Done,
    Rejected,
}

impl IngestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestState::Receiving => "receiving",
            IngestState::Validating => "validating",
            IngestState::Scanning => "scanning",
            IngestState::Committing => "committing",
            IngestState::Done => "done",
            IngestState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused upload: why, in which stage, and what was known at the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
    /// Stage the run was in when it was rejected.
    pub state: IngestState,
    pub detail: String,
    pub bytes_received: u64,
    pub limit_bytes: u64,
}

/// Terminal result of one run. Exactly one is produced per upload.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Committed(Attachment),
    Rejected(Rejection),
}

impl IngestOutcome {
    pub fn into_result(self) -> Result<Attachment, AppError> {
        match self {
            IngestOutcome::Committed(attachment) => Ok(attachment),
            IngestOutcome::Rejected(rejection) => Err(rejection.into()),
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        let Rejection {
            reason,
            detail,
            bytes_received,
            limit_bytes,
            ..
        } = rejection;
        match reason {
            RejectReason::TooLarge => AppError::TooLarge {
                size: bytes_received,
                limit: limit_bytes,
            },
            RejectReason::InvalidType => AppError::InvalidType(detail),
            RejectReason::InvalidFilename => AppError::InvalidFilename(detail),
            RejectReason::EmptyFile => AppError::EmptyFile,
            RejectReason::ScanFailed => AppError::ScanFailed(detail),
            RejectReason::StorageError => AppError::Storage(detail),
            RejectReason::Aborted => AppError::UploadAborted(detail),
        }
    }
}
