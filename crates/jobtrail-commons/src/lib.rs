// Jobtrail Commons
//
// Shared models, configuration, and error types used across all Jobtrail
// crates. Keep this crate dependency-light: serde, chrono, uuid and nothing
// heavier.

pub mod config;
pub mod errors;
pub mod models;

pub use config::ServerConfig;
pub use errors::ActivityError;
pub use models::{AuthedKey, JobKind, JobRecord};
