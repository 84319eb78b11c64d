use std::str;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use clamav_client::{clean, Tcp};

use super::{ScanEngine, ScanVerdict};

/// clamd over TCP.
///
/// The synchronous client runs inside `spawn_blocking`; the adapter bounds
/// the whole call with its timeout.
#[derive(Debug, Clone)]
pub struct ClamAvEngine {
    host: String,
    port: u16,
}

impl ClamAvEngine {
    /// # Arguments
    /// * `host` - ClamAV daemon hostname
    /// * `port` - ClamAV daemon port (typically 3310)
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pull the signature name out of a clamd reply such as
/// `stream: Eicar-Test-Signature FOUND`.
fn signature_name(response: &[u8]) -> String {
    let response = str::from_utf8(response).map(str::trim).unwrap_or("");
    if !response.contains("FOUND") {
        return "unknown".to_string();
    }
    response
        .split(':')
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("unknown")
        .to_string()
}

#[async_trait]
impl ScanEngine for ClamAvEngine {
    fn name(&self) -> &'static str {
        "clamav"
    }

    async fn scan_bytes(&self, data: Bytes) -> ScanVerdict {
        let start = Instant::now();
        let address = self.address();
        tracing::debug!(address = %address, size_bytes = data.len(), "Starting ClamAV scan");

        let result = tokio::task::spawn_blocking(move || {
            let connection = Tcp {
                host_address: address.as_str(),
            };
            match clamav_client::scan_buffer(&data, connection, None) {
                Ok(response) => match clean(&response) {
                    Ok(true) => ScanVerdict::Clean,
                    Ok(false) => ScanVerdict::Infected(signature_name(&response)),
                    Err(e) => ScanVerdict::Error(format!("Failed to parse ClamAV response: {}", e)),
                },
                Err(e) => ScanVerdict::Error(format!("ClamAV scan error: {}", e)),
            }
        })
        .await;

        let verdict = match result {
            Ok(verdict) => verdict,
            Err(e) => ScanVerdict::Error(format!("ClamAV scan task join error: {}", e)),
        };

        match &verdict {
            ScanVerdict::Clean => tracing::info!(
                duration_ms = start.elapsed().as_millis(),
                "File scan completed: clean"
            ),
            ScanVerdict::Infected(virus) => tracing::warn!(
                duration_ms = start.elapsed().as_millis(),
                virus = %virus,
                "File scan detected virus"
            ),
            ScanVerdict::Error(error) => tracing::error!(
                duration_ms = start.elapsed().as_millis(),
                error = %error,
                "ClamAV scan failed"
            ),
        }

        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signature_name() {
        assert_eq!(
            signature_name(b"stream: Eicar-Test-Signature FOUND\0"),
            "Eicar-Test-Signature"
        );
        assert_eq!(signature_name(b"stream: OK"), "unknown");
        assert_eq!(signature_name(&[0xff, 0xfe]), "unknown");
    }

    #[tokio::test]
    async fn unreachable_daemon_is_an_error() {
        // Port 1 on loopback refuses connections.
        let engine = ClamAvEngine::new("127.0.0.1".to_string(), 1);
        let verdict = engine.scan_bytes(Bytes::from_static(b"hello")).await;
        assert!(matches!(verdict, ScanVerdict::Error(_)));
    }
}
