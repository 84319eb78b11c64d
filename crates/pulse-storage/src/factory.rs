//! Storage factory for creating the staging store from configuration.

use std::sync::Arc;

use pulse_core::Config;

use crate::local::LocalStagingStore;
use crate::traits::{StagingStore, StorageResult};

/// Create the staging store rooted at the configured `STORAGE_ROOT`.
pub async fn create_staging_store(config: &Config) -> StorageResult<Arc<dyn StagingStore>> {
    let store = LocalStagingStore::new(config.storage_root()).await?;
    tracing::info!(root = %config.storage_root(), "Local storage initialized");
    Ok(Arc::new(store))
}
