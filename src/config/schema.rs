//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for nicotrans.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, served path).
    pub listener: ListenerConfig,

    /// Root certificate settings.
    pub certificate: CertificateConfig,

    /// Hosts-table redirection settings.
    pub hosts: HostsConfig,

    /// Real comment API and the resolver used to reach it.
    pub upstream: UpstreamConfig,

    /// Translation backend and chunking.
    pub translation: TranslationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to listen on. Also the address written into the hosts table.
    pub ip: IpAddr,

    /// HTTPS port.
    pub port: u16,

    /// The only path served; everything else is a 404.
    pub path: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl ListenerConfig {
    /// Socket address the TLS listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// Address clients should be redirected to.
    ///
    /// An unspecified bind address cannot be dialed, so loopback is used instead.
    pub fn redirect_target(&self) -> IpAddr {
        if self.ip.is_unspecified() {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.ip
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 443,
            path: "/api.json/".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Root certificate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,

    /// Generate a new pair when loading fails.
    pub create_if_missing: bool,

    /// Add the certificate to the user's trusted roots.
    pub install: bool,

    /// Organization written into the certificate subject.
    pub organization: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("server.crt"),
            key_path: PathBuf::from("server.key"),
            create_if_missing: true,
            install: true,
            organization: "NicoTrans".to_string(),
        }
    }
}

/// Hosts-table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostsConfig {
    /// Add the redirect entry automatically.
    pub edit: bool,

    /// Location of the hosts file.
    pub path: PathBuf,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            edit: true,
            path: default_hosts_path(),
        }
    }
}

fn default_hosts_path() -> PathBuf {
    if cfg!(windows) {
        let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
        PathBuf::from(root).join("System32").join("drivers").join("etc").join("hosts")
    } else {
        PathBuf::from("/etc/hosts")
    }
}

/// Upstream comment API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// The intercepted domain.
    pub domain: String,

    /// Full URL of the real endpoint.
    pub url: String,

    /// Public DNS server queried directly, bypassing the hosts table.
    pub dns_server: SocketAddr,

    /// How long a resolved address stays fresh, in seconds.
    pub dns_ttl_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            domain: "nmsg.nicovideo.jp".to_string(),
            url: "https://nmsg.nicovideo.jp/api.json/".to_string(),
            dns_server: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), 53),
            dns_ttl_secs: 60,
        }
    }
}

/// Which translator handles the chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Papago,
    Passthrough,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "papago" => Ok(BackendKind::Papago),
            "passthrough" | "none" => Ok(BackendKind::Passthrough),
            other => Err(format!("unknown translation platform '{}'", other)),
        }
    }
}

/// Translation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translator backend.
    pub backend: BackendKind,

    /// Two-letter source language code.
    pub source: String,

    /// Two-letter target language code.
    pub target: String,

    /// Soft upper bound for one translator call, in bytes.
    pub max_chunk_bytes: usize,

    /// Papago endpoint.
    pub papago_url: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Papago,
            source: "ja".to_string(),
            target: "ko".to_string(),
            max_chunk_bytes: 5000,
            papago_url: "https://papago.naver.com/apis/n2mt/translate".to_string(),
        }
    }
}

/// Timeout configuration for every outbound call, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Direct DNS query.
    pub dns_secs: u64,

    /// Upstream comment fetch.
    pub upstream_secs: u64,

    /// One translator call.
    pub translate_secs: u64,

    /// Whole inbound request.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            dns_secs: 5,
            upstream_secs: 15,
            translate_secs: 20,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_listener_redirects_to_loopback() {
        let mut listener = ListenerConfig::default();
        listener.ip = "0.0.0.0".parse().unwrap();
        assert_eq!(listener.redirect_target(), IpAddr::V4(Ipv4Addr::LOCALHOST));

        listener.ip = "192.168.0.10".parse().unwrap();
        assert_eq!(listener.redirect_target().to_string(), "192.168.0.10");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [translation]
            backend = "passthrough"
            target = "en"
            "#,
        )
        .unwrap();

        assert_eq!(config.translation.backend, BackendKind::Passthrough);
        assert_eq!(config.translation.target, "en");
        assert_eq!(config.translation.source, "ja");
        assert_eq!(config.translation.max_chunk_bytes, 5000);
        assert_eq!(config.listener.port, 443);
        assert_eq!(config.upstream.dns_ttl_secs, 60);
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("Papago".parse::<BackendKind>(), Ok(BackendKind::Papago));
        assert_eq!("none".parse::<BackendKind>(), Ok(BackendKind::Passthrough));
        assert!("google".parse::<BackendKind>().is_err());
    }
}
