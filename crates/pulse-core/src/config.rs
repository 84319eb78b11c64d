//! Configuration module
//!
//! Configuration is read from the process environment, with a `.env` file
//! loaded first when present. Every setting has a default so that a development
//! instance starts with no environment at all; [`Config::validate`] enforces
//! the stricter production requirements.

use std::env;

use crate::constants::DEFAULT_MAX_ATTACHMENT_BYTES;

// Common constants
const DEFAULT_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SCAN_TIMEOUT_SECS: u64 = 30;
const STAGING_MAX_AGE_SECS: u64 = 3600;
const CLAMAV_PORT: u16 = 3310;
const DEFAULT_STORAGE_ROOT: &str = "./data/storage";

const DEFAULT_ALLOWED_EXTENSIONS: &str = "txt,csv,json,pdf,png,jpg,jpeg,gif,webp,docx,xlsx,pptx";
const DEFAULT_ALLOWED_CONTENT_TYPES: &str = "text/plain,text/csv,application/json,application/pdf,\
image/png,image/jpeg,image/gif,image/webp,\
application/vnd.openxmlformats-officedocument.wordprocessingml.document,\
application/vnd.openxmlformats-officedocument.spreadsheetml.sheet,\
application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Settings shared by every process of the service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Upload constraints enforced by the constraint policy
#[derive(Clone, Debug)]
pub struct AttachmentLimits {
    /// Inclusive ceiling: an upload of exactly this many bytes is accepted.
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    /// Reject staged bytes that carry PE or ELF magic numbers.
    pub content_sniffing_enabled: bool,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            allowed_extensions: parse_list(DEFAULT_ALLOWED_EXTENSIONS),
            allowed_content_types: parse_list(DEFAULT_ALLOWED_CONTENT_TYPES),
            content_sniffing_enabled: false,
        }
    }
}

/// Content scanner configuration
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    pub clamav_enabled: bool,
    pub clamav_host: String,
    pub clamav_port: u16,
    pub timeout_secs: u64,
    /// Mounts the runtime simulation toggle route.
    pub simulation_enabled: bool,
    /// Initial simulation mode is `always` when set.
    pub simulate_infected: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            clamav_enabled: false,
            clamav_host: "localhost".to_string(),
            clamav_port: CLAMAV_PORT,
            timeout_secs: SCAN_TIMEOUT_SECS,
            simulation_enabled: false,
            simulate_infected: false,
        }
    }
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct PulseConfig {
    pub base: BaseConfig,
    /// Unset selects the in-memory repositories (refused in production).
    pub database_url: Option<String>,
    pub storage_root: String,
    pub attachments: AttachmentLimits,
    pub scanner: ScannerConfig,
    pub staging_max_age_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PulseConfig>);

impl Config {
    pub fn new(inner: PulseConfig) -> Self {
        Config(Box::new(inner))
    }

    fn inner(&self) -> &PulseConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config::new(PulseConfig::from_env()?))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn storage_root(&self) -> &str {
        &self.inner().storage_root
    }

    pub fn attachment_limits(&self) -> &AttachmentLimits {
        &self.inner().attachments
    }

    pub fn scanner(&self) -> &ScannerConfig {
        &self.inner().scanner
    }

    pub fn staging_max_age_secs(&self) -> u64 {
        self.inner().staging_max_age_secs
    }
}

impl PulseConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = parse_list(&cors_origins_str);

        // Exact byte ceiling wins over the megabyte form.
        let max_size_bytes = match env::var("ATTACHMENT_MAX_SIZE_BYTES") {
            Ok(raw) => raw.trim().parse::<u64>().unwrap_or(DEFAULT_MAX_ATTACHMENT_BYTES),
            Err(_) => env::var("ATTACHMENT_MAX_SIZE_MB")
                .ok()
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(DEFAULT_MAX_ATTACHMENT_BYTES),
        };

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_PORT),
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let attachments = AttachmentLimits {
            max_size_bytes,
            allowed_extensions: parse_list(
                &env::var("ATTACHMENT_ALLOWED_EXTENSIONS")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_string()),
            ),
            allowed_content_types: parse_list(
                &env::var("ATTACHMENT_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_CONTENT_TYPES.to_string()),
            ),
            content_sniffing_enabled: env_flag("CONTENT_SNIFFING_ENABLED", false),
        };

        let scanner = ScannerConfig {
            clamav_enabled: env_flag("CLAMAV_ENABLED", false),
            clamav_host: env::var("CLAMAV_HOST").unwrap_or_else(|_| "localhost".to_string()),
            clamav_port: env::var("CLAMAV_PORT")
                .unwrap_or_else(|_| CLAMAV_PORT.to_string())
                .parse()
                .unwrap_or(CLAMAV_PORT),
            timeout_secs: env::var("SCAN_TIMEOUT_SECS")
                .unwrap_or_else(|_| SCAN_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(SCAN_TIMEOUT_SECS),
            simulation_enabled: env_flag("SCAN_SIMULATION_ENABLED", false),
            simulate_infected: env_flag("SCAN_SIMULATE_INFECTED", false),
        };

        Ok(PulseConfig {
            base,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            storage_root: env::var("STORAGE_ROOT")
                .unwrap_or_else(|_| DEFAULT_STORAGE_ROOT.to_string()),
            attachments,
            scanner,
            staging_max_age_secs: env::var("STAGING_MAX_AGE_SECS")
                .unwrap_or_else(|_| STAGING_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(STAGING_MAX_AGE_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.attachments.max_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "ATTACHMENT_MAX_SIZE_BYTES must be greater than zero"
            ));
        }

        if self.attachments.allowed_extensions.is_empty()
            || self.attachments.allowed_content_types.is_empty()
        {
            return Err(anyhow::anyhow!(
                "ATTACHMENT_ALLOWED_EXTENSIONS and ATTACHMENT_ALLOWED_CONTENT_TYPES must not be empty"
            ));
        }

        if self.scanner.timeout_secs == 0 {
            return Err(anyhow::anyhow!("SCAN_TIMEOUT_SECS must be greater than zero"));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if is_production_env(&self.base.environment) {
            if self.database_url.is_none() {
                return Err(anyhow::anyhow!("DATABASE_URL is required in production"));
            }
            if self.base.cors_origins.iter().any(|o| o == "*") {
                return Err(anyhow::anyhow!(
                    "CORS_ORIGINS must list explicit origins in production"
                ));
            }
            if self.scanner.simulation_enabled || self.scanner.simulate_infected {
                return Err(anyhow::anyhow!(
                    "Scan simulation (SCAN_SIMULATION_ENABLED / SCAN_SIMULATE_INFECTED) cannot be used in production"
                ));
            }
            if !self.scanner.clamav_enabled {
                tracing::warn!("CLAMAV_ENABLED=false in production: attachments are not malware-screened");
            }
        }

        Ok(())
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .to_lowercase()
        .parse()
        .unwrap_or(default)
}

/// Split a comma separated list, trimming and lower-casing entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
