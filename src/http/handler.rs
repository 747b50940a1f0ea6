//! Comment proxy handler.
//!
//! # Data Flow
//! ```text
//! POST body
//!     → upstream fetch (bypass resolver)
//!     → Records::extract
//!     → TranslationEngine::translate (skipped when nothing to translate)
//!     → Records::reassemble → 200 application/json
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::comments::{Records, UpstreamClient};
use crate::http::request::request_id;
use crate::http::{response, ProxyError};
use crate::observability::metrics;
use crate::translation::{Translate, TranslationEngine};

/// Shared state injected into the handler.
pub struct AppState<T> {
    pub upstream: UpstreamClient,
    pub engine: TranslationEngine<T>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            engine: self.engine.clone(),
        }
    }
}

/// Handles every request that reached the comment path.
pub async fn comments_handler<T: Translate>(
    State(state): State<Arc<AppState<T>>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let id = request_id(request.headers()).to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let referer = request
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let path = request.uri().path().to_string();

    let response = if request.method() != Method::POST {
        response::status(StatusCode::BAD_REQUEST)
    } else {
        match axum::body::to_bytes(request.into_body(), usize::MAX).await {
            Ok(body) => match proxy_comments(&state, body).await {
                Ok(bytes) => response::comments(bytes),
                Err(e) => {
                    tracing::error!(request_id = %id, remote = %remote, error = %e, "Comment translation failed");
                    e.into_response()
                }
            },
            Err(e) => {
                tracing::warn!(request_id = %id, remote = %remote, error = %e, "Cannot read request body");
                response::status(StatusCode::PAYLOAD_TOO_LARGE)
            }
        }
    };

    let status = response.status();
    tracing::info!(
        request_id = %id,
        remote = %remote,
        path = %path,
        referer = %referer,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request handled"
    );
    metrics::record_request(status.as_u16(), start);
    response
}

async fn proxy_comments<T: Translate>(state: &AppState<T>, body: Bytes) -> Result<Vec<u8>, ProxyError> {
    let upstream_body = state.upstream.fetch(body).await?;
    let mut records = Records::from_slice(&upstream_body)?;

    let entries = records.extract();
    tracing::debug!(records = records.len(), comments = entries.len(), "Fetched comments");
    if !entries.is_empty() {
        let translations = state.engine.translate(&entries).await?;
        records.reassemble(&translations);
    }
    Ok(records.to_vec()?)
}
