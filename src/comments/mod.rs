//! Comment stream subsystem.
//!
//! # Data Flow
//! ```text
//! client body
//!     → upstream.rs (POST to the real API over the bypass resolver)
//!     → records.rs (parse, extract chat text)
//!     → [translation engine]
//!     → records.rs (write translations back, serialize)
//! ```

pub mod records;
pub mod upstream;

use thiserror::Error;

pub use records::{ExtractedText, Records};
pub use upstream::UpstreamClient;

/// Failure fetching from the real comment API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("upstream answered with status {0}")]
    Status(u16),
}

impl UpstreamError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Request(e)
        }
    }
}

/// The upstream body is not a record sequence.
#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("invalid comment JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of records, got {0}")]
    NotAnArray(&'static str),
}
