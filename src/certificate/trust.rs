//! Installing the root certificate into the current user's trust store.
//!
//! Each platform is a [`TrustStore`] backend; [`platform_trust_store`] picks one
//! at runtime. Only the public certificate ever leaves the process.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::certificate::{CertificateError, RootCredential};

/// Result of a successful install request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustOutcome {
    /// The certificate was already present; nothing was added.
    AlreadyTrusted,
    /// The certificate was added.
    Installed,
}

/// A per-user store of trusted root certificates.
pub trait TrustStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Add the credential's certificate as a trusted root, unless already present.
    fn install(&self, credential: &RootCredential) -> Result<TrustOutcome, CertificateError>;
}

/// Choose the backend for the running platform.
pub fn platform_trust_store() -> Box<dyn TrustStore> {
    match std::env::consts::OS {
        "windows" => Box::new(WindowsCertStore),
        "macos" => Box::new(MacKeychain),
        _ => Box::new(UnsupportedStore),
    }
}

/// Current-user `Root` store, managed through `certutil`.
pub struct WindowsCertStore;

impl TrustStore for WindowsCertStore {
    fn name(&self) -> &'static str {
        "windows-certutil"
    }

    fn install(&self, credential: &RootCredential) -> Result<TrustOutcome, CertificateError> {
        let serial = credential.serial_hex();
        let present = run("certutil", &["-user", "-store", "Root", &serial])?;
        if present.status.success() {
            return Ok(TrustOutcome::AlreadyTrusted);
        }

        let staged = StagedCertificate::write(credential)?;
        let added = run("certutil", &["-user", "-f", "-addstore", "Root", staged.path_str()])?;
        expect_success("certutil -addstore", &added)?;
        Ok(TrustOutcome::Installed)
    }
}

/// The login keychain, managed through `security`.
pub struct MacKeychain;

impl TrustStore for MacKeychain {
    fn name(&self) -> &'static str {
        "macos-keychain"
    }

    fn install(&self, credential: &RootCredential) -> Result<TrustOutcome, CertificateError> {
        let staged = StagedCertificate::write(credential)?;
        let verified = run("security", &["verify-cert", "-c", staged.path_str()])?;
        if verified.status.success() {
            return Ok(TrustOutcome::AlreadyTrusted);
        }

        let home = std::env::var_os("HOME")
            .ok_or_else(|| CertificateError::TrustStore("HOME is not set".to_string()))?;
        let keychain = Path::new(&home).join("Library/Keychains/login.keychain-db");
        let keychain = keychain.to_string_lossy();
        let added = run(
            "security",
            &["add-trusted-cert", "-r", "trustRoot", "-k", &keychain, staged.path_str()],
        )?;
        expect_success("security add-trusted-cert", &added)?;
        Ok(TrustOutcome::Installed)
    }
}

/// Platforms without a per-user trust-store API.
pub struct UnsupportedStore;

impl TrustStore for UnsupportedStore {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn install(&self, _credential: &RootCredential) -> Result<TrustOutcome, CertificateError> {
        Err(CertificateError::TrustStoreUnsupported(std::env::consts::OS))
    }
}

/// Operator guidance for adding the certificate by hand.
pub fn manual_install_guidance(cert_path: &Path) -> String {
    [
        "To trust the certificate manually:".to_string(),
        format!("\t1) Locate the certificate file: {}", cert_path.display()),
        "\t2) Import it into your browser or system store as a trusted root authority".to_string(),
        "\t3) Restart the browser so it picks up the new root".to_string(),
    ]
    .join("\n")
}

/// Public certificate written to a temporary file for the platform tools.
/// Removed on drop.
struct StagedCertificate {
    path: PathBuf,
    path_str: String,
}

impl StagedCertificate {
    fn write(credential: &RootCredential) -> Result<Self, CertificateError> {
        let path = std::env::temp_dir().join(format!("nicotrans-{}.crt", credential.serial_hex()));
        std::fs::write(&path, credential.cert_pem()).map_err(|source| CertificateError::Write {
            path: path.clone(),
            source,
        })?;
        let path_str = path.to_string_lossy().into_owned();
        Ok(Self { path, path_str })
    }

    fn path_str(&self) -> &str {
        &self.path_str
    }
}

impl Drop for StagedCertificate {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn run(program: &str, args: &[&str]) -> Result<Output, CertificateError> {
    tracing::debug!(program, ?args, "Running trust store command");
    Command::new(program)
        .args(args)
        .output()
        .map_err(|e| CertificateError::TrustStore(format!("failed to run {}: {}", program, e)))
}

fn expect_success(what: &str, output: &Output) -> Result<(), CertificateError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() { stdout } else { stderr };
    Err(CertificateError::TrustStore(format!(
        "{} exited with {}: {}",
        what,
        output.status,
        detail.trim()
    )))
}
