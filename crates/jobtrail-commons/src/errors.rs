//! Shared error types for Jobtrail.
//!
//! `ActivityError` is the call-level error taxonomy for the activity-history
//! subsystem. Per-item bulk outcomes (`unauthorized_or_not_found`,
//! `result_not_found`) are data values carried in response rows, never raised
//! through this type.

use std::fmt;

/// Call-level errors for activity-history operations.
///
/// Each variant maps to exactly one HTTP status at the API layer:
/// - `FeatureDisabled` -> 404 (indistinguishable from a missing resource so
///   the flag's existence is not revealed)
/// - `StoreUnavailable` -> 503
/// - `MissingScope` -> 400
/// - `Validation` -> 400
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    /// The activity-log feature is switched off for this deployment.
    FeatureDisabled,

    /// The analytical store (or a result tier) could not be reached.
    StoreUnavailable(String),

    /// The credential resolved without an api_key_id scope.
    MissingScope,

    /// Malformed or out-of-range request input.
    Validation(String),
}

impl ActivityError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }
}

impl fmt::Display for ActivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityError::FeatureDisabled => write!(f, "Not found"),
            ActivityError::StoreUnavailable(msg) => {
                write!(f, "Activity log temporarily unavailable: {}", msg)
            }
            ActivityError::MissingScope => {
                write!(f, "No API key scope is associated with this credential")
            }
            ActivityError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ActivityError {}
