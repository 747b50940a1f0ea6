//! Startup orchestration.
//!
//! # Responsibilities
//! - Point the domain at this process through the hosts table
//! - Load or create the root credential and get it trusted
//! - Build the resolver, upstream client and translator
//! - Start the HTTPS listener last
//!
//! # Design Decisions
//! - Configuration and certificate errors are fatal
//! - Privilege problems degrade to operator guidance
//! - An elevated relaunch ends this process before anything binds

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::certificate::{self, platform_trust_store, CertificateError, RootCredential};
use crate::comments::{UpstreamClient, UpstreamError};
use crate::config::ProxyConfig;
use crate::dns::{PublicDnsLookup, ResolverCache};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::redirect::{self, PrivilegeProvider, RedirectOutcome};
use crate::translation::{TranslateError, TranslationEngine, TranslatorBackend};

/// Grace period for in-flight requests on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Translator(#[from] TranslateError),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// How startup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Served until shutdown.
    Stopped,
    /// An elevated copy of this process took over.
    Relaunched,
}

/// Ensure the hosts redirect. Returns `false` when this process should exit.
pub fn prepare_redirect(config: &ProxyConfig, privilege: &dyn PrivilegeProvider) -> bool {
    let domain = &config.upstream.domain;
    let target = config.listener.redirect_target();

    if !config.hosts.edit {
        tracing::info!(domain = %domain, "Hosts editing disabled");
        return true;
    }

    match redirect::ensure_redirect(&config.hosts.path, domain, target, privilege) {
        Ok(RedirectOutcome::NeedsElevation) => false,
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot edit the hosts file");
            tracing::warn!("{}", redirect::manual_edit_guidance(&config.hosts.path, domain, target));
            true
        }
    }
}

/// Load or create the root credential and install it when configured.
pub fn prepare_certificate(config: &ProxyConfig) -> Result<RootCredential, CertificateError> {
    let credential = certificate::load_or_create(&config.certificate, &config.upstream.domain)?;
    if config.certificate.install {
        let store = platform_trust_store();
        certificate::install_or_advise(store.as_ref(), &credential, &config.certificate.cert_path);
    }
    Ok(credential)
}

/// Build the request-path state: resolver, upstream client and translator.
pub fn build_state(config: &ProxyConfig) -> Result<AppState<TranslatorBackend>, StartupError> {
    let timeouts = &config.timeouts;
    let lookup = PublicDnsLookup::new(config.upstream.dns_server, Duration::from_secs(timeouts.dns_secs));
    let cache = Arc::new(ResolverCache::new(
        lookup,
        Duration::from_secs(config.upstream.dns_ttl_secs),
    ));
    let upstream = UpstreamClient::new(
        config.upstream.url.clone(),
        cache,
        Duration::from_secs(timeouts.upstream_secs),
    )?;

    let translate_timeout = Duration::from_secs(timeouts.translate_secs);
    let backend = TranslatorBackend::from_config(&config.translation, translate_timeout)?;
    tracing::info!(
        backend = backend.name(),
        source = %config.translation.source,
        target = %config.translation.target,
        max_chunk_bytes = config.translation.max_chunk_bytes,
        "Translator ready"
    );
    let engine = TranslationEngine::new(backend, config.translation.max_chunk_bytes, translate_timeout);

    Ok(AppState { upstream, engine })
}

/// Run every startup step in order, then serve until a shutdown signal.
pub async fn run(config: ProxyConfig, privilege: &dyn PrivilegeProvider) -> Result<Startup, StartupError> {
    if !prepare_redirect(&config, privilege) {
        tracing::info!("Continuing in the elevated instance");
        return Ok(Startup::Relaunched);
    }

    let credential = prepare_certificate(&config)?;
    let state = build_state(&config)?;
    let server = HttpServer::new(&config, state);

    let shutdown = Shutdown::new(SHUTDOWN_GRACE);
    shutdown.trigger_on_signal();
    server.run(&credential, shutdown.handle()).await?;
    Ok(Startup::Stopped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::RedirectError;
    use std::io::Write;

    struct Denied;

    impl PrivilegeProvider for Denied {
        fn is_elevated(&self) -> Result<bool, RedirectError> {
            Ok(false)
        }

        fn relaunch_elevated(&self) -> Result<(), RedirectError> {
            Err(RedirectError::Elevation("user declined".into()))
        }
    }

    struct Relaunches;

    impl PrivilegeProvider for Relaunches {
        fn is_elevated(&self) -> Result<bool, RedirectError> {
            Ok(false)
        }

        fn relaunch_elevated(&self) -> Result<(), RedirectError> {
            Ok(())
        }
    }

    fn config_with_hosts(contents: &str) -> (ProxyConfig, tempfile::NamedTempFile) {
        let mut hosts = tempfile::NamedTempFile::new().unwrap();
        hosts.write_all(contents.as_bytes()).unwrap();
        let mut config = ProxyConfig::default();
        config.hosts.path = hosts.path().to_path_buf();
        (config, hosts)
    }

    #[test]
    fn failed_elevation_keeps_running() {
        let (config, _hosts) = config_with_hosts("127.0.0.1 localhost\n");
        assert!(prepare_redirect(&config, &Denied));
    }

    #[test]
    fn relaunch_ends_this_process() {
        let (config, _hosts) = config_with_hosts("127.0.0.1 localhost\n");
        assert!(!prepare_redirect(&config, &Relaunches));
    }

    #[test]
    fn present_mapping_needs_no_privilege() {
        let (config, _hosts) = config_with_hosts("127.0.0.1 nmsg.nicovideo.jp\n");
        assert!(prepare_redirect(&config, &Relaunches));
    }

    #[test]
    fn disabled_editing_skips_the_hosts_file() {
        let (mut config, _hosts) = config_with_hosts("");
        config.hosts.edit = false;
        assert!(prepare_redirect(&config, &Relaunches));
    }

    #[test]
    fn certificate_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ProxyConfig::default();
        config.certificate.cert_path = dir.path().join("server.crt");
        config.certificate.key_path = dir.path().join("server.key");
        config.certificate.install = false;

        let first = prepare_certificate(&config).unwrap();
        let second = prepare_certificate(&config).unwrap();
        assert_eq!(first.serial_hex(), second.serial_hex());
    }

    #[tokio::test]
    async fn state_builds_from_defaults() {
        let state = build_state(&ProxyConfig::default()).unwrap();
        assert_eq!(state.upstream.url(), "https://nmsg.nicovideo.jp/api.json/");
    }
}
