//! Certificate authority subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → authority.rs: load(cert, key)
//!         → on NotFound / Parse and create_if_missing: create(domain) → persist
//!     → trust.rs: install as trusted root (non-fatal; guidance on failure)
//!     → RootCredential handed to the TLS listener
//! ```
//!
//! # Design Decisions
//! - The root is never rotated automatically
//! - Trust-store failures degrade to operator guidance, never abort startup

pub mod authority;
pub mod trust;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::CertificateConfig;

pub use authority::RootCredential;
pub use trust::{manual_install_guidance, platform_trust_store, TrustOutcome, TrustStore};

/// Errors raised while managing the root credential.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// A certificate or key file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// PEM or certificate contents are malformed.
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// Key generation or signing failed.
    #[error("failed to generate certificate: {0}")]
    Generate(#[from] rcgen::Error),

    /// Writing a file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The platform tool refused or failed.
    #[error("trust store error: {0}")]
    TrustStore(String),

    /// No trust-store backend exists for this platform.
    #[error("installing a trusted root is not supported on {0}")]
    TrustStoreUnsupported(&'static str),
}

impl CertificateError {
    pub(crate) fn parse(path: &Path, reason: impl std::fmt::Display) -> Self {
        CertificateError::Parse {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Whether this load failure should trigger creating a new pair.
    pub fn is_recoverable_by_create(&self) -> bool {
        matches!(self, CertificateError::NotFound(_) | CertificateError::Parse { .. })
    }
}

/// Load the configured pair, creating and persisting a new one when allowed.
pub fn load_or_create(config: &CertificateConfig, domain: &str) -> Result<RootCredential, CertificateError> {
    match RootCredential::load(&config.cert_path, &config.key_path) {
        Ok(credential) => {
            tracing::info!(serial = %credential.serial_hex(), "Loaded root certificate");
            Ok(credential)
        }
        Err(e) if config.create_if_missing && e.is_recoverable_by_create() => {
            tracing::warn!(error = %e, "Cannot load certificate, creating a new one");
            let credential = RootCredential::create(domain, &config.organization)?;
            credential.persist(&config.cert_path, &config.key_path)?;
            tracing::info!(
                serial = %credential.serial_hex(),
                cert_path = %config.cert_path.display(),
                "Created root certificate"
            );
            Ok(credential)
        }
        Err(e) => Err(e),
    }
}

/// Install the credential as a trusted root, logging guidance instead of failing.
pub fn install_or_advise(store: &dyn TrustStore, credential: &RootCredential, cert_path: &Path) {
    tracing::info!(backend = store.name(), "Installing root certificate");
    match store.install(credential) {
        Ok(TrustOutcome::AlreadyTrusted) => {
            tracing::info!("Root certificate is already trusted");
        }
        Ok(TrustOutcome::Installed) => {
            tracing::info!(
                "Root certificate installed\n\tBrowsers that were already open may keep a cached trust list\n\tIf comments do not appear, close every browser window and reopen it"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cannot install root certificate");
            tracing::warn!("{}", manual_install_guidance(cert_path));
        }
    }
}
