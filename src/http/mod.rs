//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (axum setup, middleware)
//!     → request.rs (request id)
//!     → handler.rs (method check, fetch, translate, reassemble)
//!     → response.rs (JSON body or bare status)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

use thiserror::Error;

use crate::comments::{RecordsError, UpstreamError};
use crate::translation::TranslateError;

pub use handler::AppState;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, HttpServer};

/// Anything that fails a single comment request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Records(#[from] RecordsError),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}
