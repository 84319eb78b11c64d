//! Pulse Storage Library
//!
//! Attachment bytes live on the local filesystem under a single storage root.
//! Uploads are first written into a private staging area (`<root>/.staging`)
//! and only become addressable when they are promoted, with a single rename,
//! to their final key.
//!
//! # Storage key format
//!
//! `attachments/{organization_id}/{project_id}/{attachment_id}`
//!
//! Keys must not contain `..`, a leading `/`, or a dot-prefixed first
//! component (which would reach into the staging area).

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

pub use factory::create_staging_store;
pub use keys::attachment_key;
pub use local::LocalStagingStore;
pub use traits::{StagedFile, StagingStore, StagingToken, StorageError, StorageResult};
