//! Database repositories for the data access layer
//!
//! Each repository is a trait with a PostgreSQL implementation and an
//! in-memory implementation. The in-memory variants back development
//! instances without `DATABASE_URL` and the test suites.

pub mod attachment;
pub mod factory;
pub mod memory;
pub mod project;

pub use attachment::{AttachmentRepository, PostgresAttachmentRepository};
pub use factory::{create_repositories, Repositories};
pub use memory::{InMemoryAttachmentRepository, InMemoryProjectRepository};
pub use project::{PostgresProjectRepository, ProjectRepository};
