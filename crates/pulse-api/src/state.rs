//! Application state shared by every handler.

use pulse_core::Config;
use pulse_db::ProjectRepository;
use pulse_services::{AttachmentService, IngestionOrchestrator, ScanSimulation};
use pulse_storage::StagingStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub projects: Arc<dyn ProjectRepository>,
    pub ingestion: IngestionOrchestrator,
    pub attachments: AttachmentService,
    pub store: Arc<dyn StagingStore>,
    /// Same flag the scanner adapter reads; the admin routes flip it.
    pub scan_simulation: ScanSimulation,
    /// "postgres" or "in-memory", reported by the health check
    pub repository_backend: &'static str,
}
