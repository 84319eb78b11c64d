//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use pulse_core::Config;

/// Validate critical configuration values
///
/// Runs the configuration's own checks, then those that only matter to the
/// HTTP process.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() {
        let env_var = std::env::var("ENVIRONMENT")
            .or_else(|_| std::env::var("APP_ENV"))
            .ok();
        if env_var.is_none() {
            tracing::warn!(
                "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
            );
        }
    }

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.staging_max_age_secs() == 0 {
        return Err(anyhow::anyhow!(
            "STAGING_MAX_AGE_SECS cannot be 0 - in-flight uploads would be swept"
        ));
    }

    let limits = config.attachment_limits();
    tracing::info!(
        max_size_bytes = limits.max_size_bytes,
        extensions = %limits.allowed_extensions.join(","),
        content_sniffing = limits.content_sniffing_enabled,
        clamav_enabled = config.scanner().clamav_enabled,
        "Configuration validation passed"
    );
    Ok(())
}
