//! Shared data models.

pub mod identity;
pub mod job_kind;
pub mod job_record;

pub use identity::AuthedKey;
pub use job_kind::JobKind;
pub use job_record::JobRecord;
