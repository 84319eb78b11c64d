//! Pulse API Library
//!
//! This crate provides the HTTP boundary of the attachment ingestion
//! pipeline: handlers, extractors, error rendering, and application setup.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;
mod utils;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
pub use state::AppState;
