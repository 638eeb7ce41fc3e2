//! Store-level error type.

use thiserror::Error;

/// Errors raised by the store clients.
///
/// "Not found" is never an error at this layer; tier getters return
/// `Ok(None)` and the analytics client returns an empty row set.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached at all.
    #[error("store transport error: {0}")]
    Transport(String),

    /// The backend was reached but rejected the request.
    #[error("store backend error: {0}")]
    Backend(String),

    /// Object storage operation failed.
    #[error("object storage error: {0}")]
    ObjectStore(String),

    /// The backend responded with something we could not decode.
    #[error("store response decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            StoreError::Transport(e.to_string())
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}
