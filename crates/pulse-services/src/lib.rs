//! Pulse Services Library
//!
//! The attachment ingestion pipeline: the content scanner adapter, the
//! ingestion orchestrator that drives an upload from the request body to a
//! committed attachment, and attachment deletion.

pub mod attachments;
pub mod ingest;
pub mod scanner;

pub use attachments::AttachmentService;
pub use ingest::{
    IngestOutcome, IngestRequest, IngestState, IngestionOrchestrator, Rejection, SizeLimitExceeded,
};
#[cfg(feature = "clamav")]
pub use scanner::ClamAvEngine;
pub use scanner::{
    DisabledEngine, ScanEngine, ScanSimulation, ScanVerdict, ScannerAdapter, SimulationMode,
};
