//! Upload constraint policy
//!
//! Pure checks applied to an incoming attachment: size ceiling, type
//! allow-list, filename sanitation and optional content sniffing.

mod content_type;
mod filename;
mod policy;

pub use content_type::{expected_content_types, is_executable, normalize_media_type};
pub use filename::sanitize_filename;
pub use policy::{ConstraintPolicy, RejectReason, SizeCheck, Verdict};
