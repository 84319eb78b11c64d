use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;

use super::{ScanEngine, ScanSimulation, ScanVerdict};

/// Runs an engine under the simulation flag and a timeout.
///
/// Anything other than an explicit `Clean` from the engine (timeout, engine
/// error, panicked engine task) comes back as `Error`, which the orchestrator
/// treats as a rejection. There is no retry.
#[derive(Clone)]
pub struct ScannerAdapter {
    engine: Arc<dyn ScanEngine>,
    simulation: ScanSimulation,
    timeout: Duration,
}

impl ScannerAdapter {
    pub fn new(engine: Arc<dyn ScanEngine>, simulation: ScanSimulation, timeout: Duration) -> Self {
        Self {
            engine,
            simulation,
            timeout,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn simulation(&self) -> &ScanSimulation {
        &self.simulation
    }

    pub async fn scan(&self, data: Bytes) -> ScanVerdict {
        if self.simulation.take() {
            tracing::warn!(engine = self.engine.name(), "Scan simulation active, reporting infection");
            return ScanVerdict::Infected("simulated".to_string());
        }

        let start = Instant::now();
        let engine = Arc::clone(&self.engine);
        let task = tokio::spawn(async move { engine.scan_bytes(data).await });
        let abort = task.abort_handle();

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                tracing::error!(engine = self.engine.name(), error = %e, "Scan task failed");
                ScanVerdict::Error(format!("scan task failed: {}", e))
            }
            Err(_) => {
                abort.abort();
                tracing::error!(
                    engine = self.engine.name(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    duration_ms = start.elapsed().as_millis(),
                    "Scan timed out"
                );
                ScanVerdict::Error(format!(
                    "scan timed out after {:.1} seconds",
                    self.timeout.as_secs_f64()
                ))
            }
        }
    }
}
