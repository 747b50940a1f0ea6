//! Shutdown coordination for the proxy.

use std::time::Duration;

use axum_server::Handle;

use crate::lifecycle::signals::wait_for_shutdown_signal;

/// Coordinator for graceful shutdown.
///
/// Wraps the server handle so the listener stops accepting first and
/// in-flight requests get `grace` to finish.
#[derive(Clone)]
pub struct Shutdown {
    handle: Handle,
    grace: Duration,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new(grace: Duration) -> Self {
        Self {
            handle: Handle::new(),
            grace,
        }
    }

    /// Handle to pass to the server.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Stop accepting and drain.
    pub fn trigger(&self) {
        tracing::info!(grace_secs = self.grace.as_secs(), "Draining connections");
        self.handle.graceful_shutdown(Some(self.grace));
    }

    /// Trigger on the first shutdown signal.
    pub fn trigger_on_signal(&self) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            this.trigger();
        })
    }

    /// Connections currently open.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }
}
