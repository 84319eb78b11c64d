//! Pulse Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! upload constraint policy shared by every Pulse component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{AttachmentLimits, BaseConfig, Config, ScannerConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use validation::{ConstraintPolicy, RejectReason, SizeCheck, Verdict};
