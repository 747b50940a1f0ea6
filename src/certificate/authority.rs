//! Root credential lifecycle: create, load, persist.
//!
//! The root certificate is presented directly by the listener, so it carries
//! both the CA bit and the intercepted domain as its only SAN.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, KeyUsagePurpose, PublicKeyData, SerialNumber,
};
use rustls_pemfile::Item;
use time::{Duration, OffsetDateTime};
use x509_parser::parse_x509_certificate;

use crate::certificate::CertificateError;

/// Validity window of a generated root, in days (10 years).
pub const VALIDITY_DAYS: i64 = 3650;

/// A self-signed root certificate and its private key.
#[derive(Clone)]
pub struct RootCredential {
    cert_pem: String,
    key_pem: String,
    cert_der: Vec<u8>,
    serial: Vec<u8>,
    public_key: Vec<u8>,
}

impl std::fmt::Debug for RootCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootCredential")
            .field("serial", &self.serial_hex())
            .finish_non_exhaustive()
    }
}

impl RootCredential {
    /// Generate a fresh key pair and self-signed root for `domain`.
    pub fn create(domain: &str, organization: &str) -> Result<Self, CertificateError> {
        let mut params = CertificateParams::new(vec![domain.to_string()])?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, organization);
        dn.push(DnType::CommonName, format!("{} Root", organization));
        params.distinguished_name = dn;

        params.serial_number = Some(SerialNumber::from(rand::thread_rng().gen::<u64>()));
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature, KeyUsagePurpose::KeyCertSign];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + Duration::days(VALIDITY_DAYS);

        let key_pair = KeyPair::generate()?;
        let cert = params.self_signed(&key_pair)?;

        Self::from_pem(cert.pem(), key_pair.serialize_pem(), Path::new("<generated>"))
    }

    /// Load a previously persisted pair.
    ///
    /// A missing file is reported as [`CertificateError::NotFound`]. Unreadable
    /// PEM, or a key that does not belong to the certificate, is reported as
    /// [`CertificateError::Parse`]; callers treat both as "create a new one".
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, CertificateError> {
        let cert_pem = read_pem(cert_path)?;
        let key_pem = read_pem(key_path)?;

        let key = rustls_pemfile::read_one(&mut key_pem.as_bytes())
            .map_err(|e| CertificateError::parse(key_path, e))?;
        match key {
            Some(Item::Pkcs1Key(_)) | Some(Item::Pkcs8Key(_)) | Some(Item::Sec1Key(_)) => {}
            _ => return Err(CertificateError::parse(key_path, "no private key block found")),
        }
        let key_pair = KeyPair::from_pem(&key_pem).map_err(|e| CertificateError::parse(key_path, e))?;

        let credential = Self::from_pem(cert_pem, key_pem, cert_path)?;
        if credential.public_key != key_pair.der_bytes() {
            return Err(CertificateError::parse(
                key_path,
                "private key does not match the certificate",
            ));
        }
        Ok(credential)
    }

    fn from_pem(cert_pem: String, key_pem: String, source: &Path) -> Result<Self, CertificateError> {
        let cert_der = rustls_pemfile::certs(&mut cert_pem.as_bytes())
            .next()
            .ok_or_else(|| CertificateError::parse(source, "no CERTIFICATE block found"))?
            .map_err(|e| CertificateError::parse(source, e))?
            .to_vec();

        let (_, cert) = parse_x509_certificate(&cert_der).map_err(|e| CertificateError::parse(source, e))?;
        let serial = cert.tbs_certificate.raw_serial().to_vec();
        let public_key = cert.public_key().subject_public_key.data.to_vec();

        Ok(Self {
            cert_pem,
            key_pem,
            cert_der,
            serial,
            public_key,
        })
    }

    /// Write the certificate and key to two files, replacing prior content.
    ///
    /// Both files are staged next to their targets and renamed into place. If
    /// the key cannot be put in place after the certificate was, the previous
    /// certificate is written back so the old pair stays consistent. This is
    /// best effort: a failure while restoring is not reported separately.
    pub fn persist(&self, cert_path: &Path, key_path: &Path) -> Result<(), CertificateError> {
        let cert_staged = staging_path(cert_path);
        let key_staged = staging_path(key_path);
        let previous_cert = fs::read(cert_path).ok();

        let result = write_private(&cert_staged, self.cert_pem.as_bytes())
            .and_then(|_| write_private(&key_staged, self.key_pem.as_bytes()))
            .and_then(|_| rename(&cert_staged, cert_path))
            .and_then(|_| {
                rename(&key_staged, key_path).inspect_err(|_| match &previous_cert {
                    Some(old) => {
                        let _ = write_private(cert_path, old);
                    }
                    None => {
                        let _ = fs::remove_file(cert_path);
                    }
                })
            });

        if result.is_err() {
            let _ = fs::remove_file(&cert_staged);
            let _ = fs::remove_file(&key_staged);
        }
        result
    }

    /// PEM-encoded certificate.
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    /// PEM-encoded private key.
    pub fn key_pem(&self) -> &str {
        &self.key_pem
    }

    /// DER-encoded certificate.
    pub fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }

    /// Serial number as lowercase hex without separators.
    pub fn serial_hex(&self) -> String {
        self.serial.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

fn read_pem(path: &Path) -> Result<String, CertificateError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CertificateError::NotFound(path.to_path_buf()),
        _ => CertificateError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_private(path: &Path, contents: &[u8]) -> Result<(), CertificateError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options
        .open(path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .map_err(|source| CertificateError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn rename(from: &Path, to: &Path) -> Result<(), CertificateError> {
    fs::rename(from, to).map_err(|source| CertificateError::Write {
        path: to.to_path_buf(),
        source,
    })
}
