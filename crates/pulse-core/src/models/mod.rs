//! Data models for the application

mod attachment;
mod project;

pub use attachment::*;
pub use project::*;
