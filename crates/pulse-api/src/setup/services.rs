//! Service initialization

use crate::state::AppState;
use anyhow::Result;
use pulse_core::{ConstraintPolicy, Config};
use pulse_db::{create_repositories, Repositories};
use pulse_services::{
    AttachmentService, DisabledEngine, IngestionOrchestrator, ScanEngine, ScanSimulation,
    ScannerAdapter, SimulationMode,
};
use pulse_storage::StagingStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Initialize all services and repositories
pub fn initialize_services(
    config: &Config,
    pool: Option<PgPool>,
    store: Arc<dyn StagingStore>,
) -> Result<Arc<AppState>> {
    let repositories = create_repositories(pool);
    let engine = create_scan_engine(config);

    Ok(Arc::new(build_state(config, repositories, store, engine)))
}

/// Wire the pipeline from its parts. The scan simulation flag starts in the
/// configured mode and is shared between the adapter and the admin routes.
pub fn build_state(
    config: &Config,
    repositories: Repositories,
    store: Arc<dyn StagingStore>,
    engine: Arc<dyn ScanEngine>,
) -> AppState {
    let initial_mode = if config.scanner().simulate_infected {
        tracing::warn!("SCAN_SIMULATE_INFECTED=true: every scan reports an infection");
        SimulationMode::Always
    } else {
        SimulationMode::Off
    };
    let scan_simulation = ScanSimulation::new(initial_mode);

    let scanner = ScannerAdapter::new(
        engine,
        scan_simulation.clone(),
        Duration::from_secs(config.scanner().timeout_secs),
    );
    let policy = Arc::new(ConstraintPolicy::new(config.attachment_limits().clone()));

    let ingestion = IngestionOrchestrator::new(
        policy,
        Arc::clone(&store),
        scanner,
        Arc::clone(&repositories.attachments),
    );
    let attachments = AttachmentService::new(Arc::clone(&store), repositories.attachments);

    AppState {
        config: config.clone(),
        projects: repositories.projects,
        ingestion,
        attachments,
        store,
        scan_simulation,
        repository_backend: repositories.backend,
    }
}

fn create_scan_engine(config: &Config) -> Arc<dyn ScanEngine> {
    let scanner = config.scanner();
    if !scanner.clamav_enabled {
        tracing::info!("Malware scanning disabled, uploads are committed unscanned");
        return Arc::new(DisabledEngine);
    }

    #[cfg(feature = "clamav")]
    {
        tracing::info!(
            host = %scanner.clamav_host,
            port = scanner.clamav_port,
            timeout_secs = scanner.timeout_secs,
            "ClamAV scanning enabled"
        );
        Arc::new(pulse_services::ClamAvEngine::new(
            scanner.clamav_host.clone(),
            scanner.clamav_port,
        ))
    }

    #[cfg(not(feature = "clamav"))]
    {
        tracing::warn!("CLAMAV_ENABLED=true but the clamav feature is not compiled in; scanning disabled");
        Arc::new(DisabledEngine)
    }
}
