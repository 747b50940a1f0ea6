//! Response construction.
//!
//! Error responses never carry the underlying cause; it is logged instead.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::ProxyError;

/// `200` with the re-serialized record sequence.
pub fn comments(body: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}

/// A bare status with its canonical reason as the body.
pub fn status(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("");
    (status, reason.to_string()).into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
