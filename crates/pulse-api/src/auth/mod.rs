//! Organization context

pub mod models;

pub use models::OrgContext;
