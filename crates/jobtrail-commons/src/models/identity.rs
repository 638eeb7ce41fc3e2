//! Resolved caller identity.
//!
//! Credential resolution happens upstream (the API gateway authenticates the
//! raw key and forwards the resolved scope). This type is what the rest of
//! the service sees.

/// Authorization scope of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedKey {
    /// Numeric id of the API key, or `None` when the credential resolved
    /// without a key scope (e.g. a team-level session token).
    pub api_key_id: Option<u64>,
    pub team_id: String,
}

impl AuthedKey {
    pub fn new(api_key_id: Option<u64>, team_id: impl Into<String>) -> Self {
        Self {
            api_key_id,
            team_id: team_id.into(),
        }
    }
}
