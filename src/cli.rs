//! Command line.
//!
//! Every flag is optional; a given flag overrides the matching value from the
//! configuration file (or the built-in default when no file is given).

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{BackendKind, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "nicotrans")]
#[command(about = "Translating proxy for the nicovideo comment API", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Listen address, also written into the hosts file
    #[arg(long)]
    pub ip: Option<IpAddr>,

    /// HTTPS port
    #[arg(long)]
    pub port: Option<u16>,

    /// Root certificate path
    #[arg(long, value_name = "PATH")]
    pub cert: Option<PathBuf>,

    /// Root certificate private key path
    #[arg(long = "cert-privatekey", value_name = "PATH")]
    pub cert_privatekey: Option<PathBuf>,

    /// Create the certificate when it cannot be loaded
    #[arg(long = "cert-create", action = ArgAction::Set, value_name = "BOOL")]
    pub cert_create: Option<bool>,

    /// Install the certificate as a trusted root
    #[arg(long = "cert-install", action = ArgAction::Set, value_name = "BOOL")]
    pub cert_install: Option<bool>,

    /// Add the redirect to the hosts file
    #[arg(long = "hosts-edit", action = ArgAction::Set, value_name = "BOOL")]
    pub hosts_edit: Option<bool>,

    /// Translator backend (papago, passthrough)
    #[arg(long = "lang-platform", value_name = "NAME")]
    pub lang_platform: Option<BackendKind>,

    /// Two-letter source language code
    #[arg(long = "lang-source", value_name = "CODE")]
    pub lang_source: Option<String>,

    /// Two-letter target language code
    #[arg(long = "lang-target", value_name = "CODE")]
    pub lang_target: Option<String>,

    /// Maximum bytes per translator call
    #[arg(long = "chunk-size", value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Copy every given flag onto `config`.
    pub fn apply_overrides(&self, config: &mut ProxyConfig) {
        if let Some(ip) = self.ip {
            config.listener.ip = ip;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(path) = &self.cert {
            config.certificate.cert_path = path.clone();
        }
        if let Some(path) = &self.cert_privatekey {
            config.certificate.key_path = path.clone();
        }
        if let Some(create) = self.cert_create {
            config.certificate.create_if_missing = create;
        }
        if let Some(install) = self.cert_install {
            config.certificate.install = install;
        }
        if let Some(edit) = self.hosts_edit {
            config.hosts.edit = edit;
        }
        if let Some(backend) = self.lang_platform {
            config.translation.backend = backend;
        }
        if let Some(source) = &self.lang_source {
            config.translation.source = source.clone();
        }
        if let Some(target) = &self.lang_target {
            config.translation.target = target.clone();
        }
        if let Some(size) = self.chunk_size {
            config.translation.max_chunk_bytes = size;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}
