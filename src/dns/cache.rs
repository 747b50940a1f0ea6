//! Time-boxed resolution cache.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::dns::{HostLookup, ResolveError};
use crate::observability::metrics;

/// A resolved address and when it was obtained.
#[derive(Debug, Clone, Copy)]
struct ResolutionEntry {
    address: Ipv4Addr,
    resolved_at: Instant,
}

/// Hostname → address cache in front of a [`HostLookup`].
///
/// The map lock is held across a miss, so concurrent misses for the same
/// hostname produce a single query and every waiter sees its result.
pub struct ResolverCache<L> {
    lookup: L,
    ttl: Duration,
    entries: Mutex<HashMap<String, ResolutionEntry>>,
}

impl<L: HostLookup> ResolverCache<L> {
    /// Create a cache whose entries stay fresh for `ttl`.
    pub fn new(lookup: L, ttl: Duration) -> Self {
        Self {
            lookup,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return a fresh address for `host`, querying when absent or stale.
    pub async fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolveError> {
        let key = host.trim_end_matches('.').to_ascii_lowercase();
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&key) {
            if entry.resolved_at.elapsed() < self.ttl {
                metrics::record_dns_lookup(true);
                return Ok(entry.address);
            }
        }

        metrics::record_dns_lookup(false);
        let address = self.lookup.lookup_ipv4(&key).await?;
        tracing::debug!(host = %key, %address, "Resolved upstream host");
        entries.insert(
            key,
            ResolutionEntry {
                address,
                resolved_at: Instant::now(),
            },
        );
        Ok(address)
    }
}
