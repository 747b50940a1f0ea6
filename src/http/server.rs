//! HTTPS server setup.
//!
//! # Responsibilities
//! - Build the axum router: one comment route, 404 for everything else
//! - Wire up middleware (request id, CORS header, tracing, limits, timeout)
//! - Serve over TLS with the root credential until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::certificate::RootCredential;
use crate::config::ProxyConfig;
use crate::http::handler::{comments_handler, AppState};
use crate::http::request::UuidRequestId;
use crate::http::response;
use crate::translation::Translate;

/// HTTPS server for the comment proxy.
pub struct HttpServer {
    router: Router,
    address: SocketAddr,
}

impl HttpServer {
    /// Create a server for `config` dispatching to `state`.
    pub fn new<T: Translate>(config: &ProxyConfig, state: AppState<T>) -> Self {
        Self {
            router: build_router(config, state),
            address: config.listener.bind_address(),
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Serve over TLS with `credential` until `handle` is shut down.
    pub async fn run(self, credential: &RootCredential, handle: Handle) -> Result<(), std::io::Error> {
        let tls = RustlsConfig::from_pem(
            credential.cert_pem().as_bytes().to_vec(),
            credential.key_pem().as_bytes().to_vec(),
        )
        .await?;

        tracing::info!(address = %self.address, "HTTPS server starting");

        axum_server::bind_rustls(self.address, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Build the router with all middleware layers.
#[allow(deprecated)]
pub fn build_router<T: Translate>(config: &ProxyConfig, state: AppState<T>) -> Router {
    Router::new()
        .route(&config.listener.path, any(comments_handler::<T>))
        .fallback(not_found)
        .with_state(Arc::new(state))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

async fn not_found() -> Response {
    response::status(StatusCode::NOT_FOUND)
}
