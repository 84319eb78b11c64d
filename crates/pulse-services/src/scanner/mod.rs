//! Content scanner adapter
//!
//! A [`ScanEngine`] inspects bytes; the [`ScannerAdapter`] wraps an engine
//! with the simulation flag and a timeout, and fails closed.

mod adapter;
#[cfg(feature = "clamav")]
mod clamav;
mod simulation;

use async_trait::async_trait;
use bytes::Bytes;

pub use adapter::ScannerAdapter;
#[cfg(feature = "clamav")]
pub use clamav::ClamAvEngine;
pub use simulation::{ScanSimulation, SimulationMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected(String),
    Error(String),
}

impl ScanVerdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, ScanVerdict::Clean)
    }
}

/// A malware scanning backend.
#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    async fn scan_bytes(&self, data: Bytes) -> ScanVerdict;
}

/// Engine used when scanning is disabled by configuration. Every scan is clean.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEngine;

#[async_trait]
impl ScanEngine for DisabledEngine {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn scan_bytes(&self, _data: Bytes) -> ScanVerdict {
        ScanVerdict::Clean
    }
}
