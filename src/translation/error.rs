//! Translation errors.

use std::time::Duration;

use thiserror::Error;

/// A failed translator call. One failed chunk fails the whole request.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The translator could not be reached or the transfer broke.
    #[error("translator request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The translator answered with a non-success status.
    #[error("translator answered with status {0}")]
    Status(u16),

    /// The call exceeded the per-call deadline.
    #[error("translator call timed out after {0:?}")]
    Timeout(Duration),

    /// The response did not carry a translation.
    #[error("unreadable translator response: {0}")]
    Decode(String),
}
