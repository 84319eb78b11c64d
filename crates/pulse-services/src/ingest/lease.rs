use std::sync::Arc;

use pulse_storage::{StagingStore, StagingToken};

/// Ownership of a staging entry for the duration of one run.
///
/// Whoever holds the lease is responsible for the entry. If the lease is
/// dropped while still armed (the request future was cancelled), the entry
/// is discarded in the background.
pub(crate) struct StagingLease {
    store: Arc<dyn StagingStore>,
    token: StagingToken,
    armed: bool,
}

impl StagingLease {
    pub(crate) fn new(store: Arc<dyn StagingStore>, token: StagingToken) -> Self {
        Self {
            store,
            token,
            armed: true,
        }
    }

    pub(crate) fn token(&self) -> StagingToken {
        self.token
    }

    /// Discard the entry now.
    pub(crate) async fn discard(mut self) {
        self.armed = false;
        if let Err(e) = self.store.discard(self.token).await {
            tracing::error!(token = %self.token, error = %e, "Failed to discard staging entry");
        }
    }

    /// Hand responsibility for the entry to someone else.
    pub(crate) fn release(mut self) -> StagingToken {
        self.armed = false;
        self.token
    }
}

impl Drop for StagingLease {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let store = Arc::clone(&self.store);
        let token = self.token;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!(token = %token, "Upload cancelled, discarding staging entry");
                handle.spawn(async move {
                    if let Err(e) = store.discard(token).await {
                        tracing::error!(token = %token, error = %e, "Failed to discard staging entry");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(token = %token, "No runtime to discard staging entry; left for the startup sweep");
            }
        }
    }
}
