//! Scripted scan engines.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use pulse_services::{ScanEngine, ScanVerdict};
use std::time::Duration;

/// Test signature carried by "infected" fixtures.
pub const INFECTED_MARKER: &[u8] = b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

/// Reports an infection when the content carries [`INFECTED_MARKER`].
pub struct MarkerEngine;

#[async_trait]
impl ScanEngine for MarkerEngine {
    fn name(&self) -> &'static str {
        "marker"
    }

    async fn scan_bytes(&self, data: Bytes) -> ScanVerdict {
        let infected = data
            .windows(INFECTED_MARKER.len())
            .any(|window| window == INFECTED_MARKER);
        if infected {
            ScanVerdict::Infected("Eicar-Test-Signature".to_string())
        } else {
            ScanVerdict::Clean
        }
    }
}

/// Always fails, as an unreachable daemon would.
pub struct UnavailableEngine;

#[async_trait]
impl ScanEngine for UnavailableEngine {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn scan_bytes(&self, _data: Bytes) -> ScanVerdict {
        ScanVerdict::Error("connection refused".to_string())
    }
}

/// Never answers within the adapter timeout.
pub struct StalledEngine(pub Duration);

#[async_trait]
impl ScanEngine for StalledEngine {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn scan_bytes(&self, _data: Bytes) -> ScanVerdict {
        tokio::time::sleep(self.0).await;
        ScanVerdict::Clean
    }
}
