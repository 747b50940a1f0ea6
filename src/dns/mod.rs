//! Resolver bypass subsystem.
//!
//! # Data Flow
//! ```text
//! reqwest connects to the upstream host
//!     → BypassResolver (reqwest::dns::Resolve)
//!     → cache.rs: fresh entry? return it
//!     → lookup.rs: A query straight to the public DNS server
//! ```
//!
//! # Design Decisions
//! - Never consults the OS resolver or hosts table
//! - No retries and no fallback server; a failure fails the current request only

pub mod cache;
pub mod lookup;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub use cache::ResolverCache;
pub use lookup::{HostLookup, PublicDnsLookup};

/// Errors raised while resolving the upstream host.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Socket I/O failed.
    #[error("DNS query for {host} failed: {source}")]
    Io {
        host: String,
        source: std::io::Error,
    },

    /// No response within the configured timeout.
    #[error("DNS query for {host} timed out after {after:?}")]
    Timeout { host: String, after: Duration },

    /// The query could not be encoded or the response decoded.
    #[error("malformed DNS exchange for {host}: {reason}")]
    Protocol { host: String, reason: String },

    /// The server answered with an error code.
    #[error("DNS server answered {code} for {host}")]
    ResponseCode { host: String, code: String },

    /// The response carried no A record.
    #[error("no A record for {0}")]
    NoAnswer(String),
}

impl ResolveError {
    pub(crate) fn protocol(host: &str, reason: impl std::fmt::Display) -> Self {
        ResolveError::Protocol {
            host: host.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Plugs a [`ResolverCache`] into reqwest's connector.
pub struct BypassResolver<L> {
    cache: Arc<ResolverCache<L>>,
}

impl<L> BypassResolver<L> {
    pub fn new(cache: Arc<ResolverCache<L>>) -> Self {
        Self { cache }
    }
}

impl<L: HostLookup> reqwest::dns::Resolve for BypassResolver<L> {
    fn resolve(&self, name: reqwest::dns::Name) -> reqwest::dns::Resolving {
        let cache = Arc::clone(&self.cache);
        Box::pin(async move {
            let address = cache.resolve(name.as_str()).await?;
            // reqwest replaces port 0 with the port from the URL.
            let addrs: reqwest::dns::Addrs =
                Box::new(std::iter::once(SocketAddr::new(IpAddr::V4(address), 0)));
            Ok(addrs)
        })
    }
}
