//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, chunk size > 0)
//! - Check that URLs parse and the upstream URL targets the intercepted domain
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.listener.path.starts_with('/') {
        errors.push(ValidationError::new("listener.path", "must start with '/'"));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }

    if config.certificate.cert_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("certificate.cert_path", "must not be empty"));
    }
    if config.certificate.key_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("certificate.key_path", "must not be empty"));
    }
    if config.certificate.cert_path == config.certificate.key_path {
        errors.push(ValidationError::new(
            "certificate.key_path",
            "must differ from certificate.cert_path",
        ));
    }

    if config.upstream.domain.trim().is_empty() {
        errors.push(ValidationError::new("upstream.domain", "must not be empty"));
    }
    match url::Url::parse(&config.upstream.url) {
        Ok(url) => {
            // A local mock upstream (IP literal) is allowed; a different domain is not.
            let host_matches = match url.host() {
                Some(url::Host::Domain(host)) => host.eq_ignore_ascii_case(&config.upstream.domain),
                Some(_) => true,
                None => false,
            };
            if !host_matches {
                errors.push(ValidationError::new(
                    "upstream.url",
                    format!("host must be '{}'", config.upstream.domain),
                ));
            }
        }
        Err(e) => errors.push(ValidationError::new("upstream.url", e.to_string())),
    }
    if config.upstream.dns_ttl_secs == 0 {
        errors.push(ValidationError::new("upstream.dns_ttl_secs", "must be greater than 0"));
    }

    if config.translation.source.trim().is_empty() {
        errors.push(ValidationError::new("translation.source", "must not be empty"));
    }
    if config.translation.target.trim().is_empty() {
        errors.push(ValidationError::new("translation.target", "must not be empty"));
    }
    if config.translation.max_chunk_bytes == 0 {
        errors.push(ValidationError::new("translation.max_chunk_bytes", "must be greater than 0"));
    }
    if let Err(e) = url::Url::parse(&config.translation.papago_url) {
        errors.push(ValidationError::new("translation.papago_url", e.to_string()));
    }

    let timeouts = [
        ("timeouts.dns_secs", config.timeouts.dns_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.translate_secs", config.timeouts.translate_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
