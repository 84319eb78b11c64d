//! Storage setup

use anyhow::{Context, Result};
use pulse_core::Config;
use pulse_storage::{create_staging_store, StagingStore};
use std::sync::Arc;
use std::time::Duration;

/// Create the staging store and sweep staging entries abandoned by a crashed
/// process.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn StagingStore>> {
    let store = create_staging_store(config)
        .await
        .context("Failed to initialize storage")?;

    let max_age = Duration::from_secs(config.staging_max_age_secs());
    let swept = store
        .sweep_stale(max_age)
        .await
        .context("Failed to sweep stale staging entries")?;
    if swept > 0 {
        tracing::warn!(
            swept,
            max_age_secs = max_age.as_secs(),
            "Removed stale staging entries"
        );
    }

    Ok(store)
}
