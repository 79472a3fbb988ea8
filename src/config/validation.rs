//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the upstream URL and value ranges
//! - Make sure header-bound strings are representable as header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in a configuration.
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "origin.bind_address", &config.origin.bind_address);
    check_socket_addr(&mut errors, "relay.bind_address", &config.relay.bind_address);

    if config.origin.file_path.trim().is_empty() {
        errors.push(ValidationError::new("origin.file_path", "must not be empty"));
    }

    let name = &config.origin.download_name;
    if name.is_empty() {
        errors.push(ValidationError::new("origin.download_name", "must not be empty"));
    } else if name.contains('"') || name.contains('\\') || name.chars().any(char::is_control) {
        errors.push(ValidationError::new(
            "origin.download_name",
            "must not contain quotes, backslashes or control characters",
        ));
    }

    if HeaderValue::from_str(&config.origin.content_type).is_err()
        || config.origin.content_type.is_empty()
    {
        errors.push(ValidationError::new(
            "origin.content_type",
            format!("'{}' is not a valid header value", config.origin.content_type),
        ));
    }

    match Url::parse(&config.relay.upstream_url) {
        Ok(url) => {
            if url.scheme() != "http" {
                errors.push(ValidationError::new(
                    "relay.upstream_url",
                    format!("unsupported scheme '{}', expected http", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("relay.upstream_url", "missing host"));
            }
        }
        Err(e) => errors.push(ValidationError::new(
            "relay.upstream_url",
            format!("'{}' is not a valid URL: {}", config.relay.upstream_url, e),
        )),
    }

    if config.relay.chunk_size == 0 {
        errors.push(ValidationError::new("relay.chunk_size", "must be greater than 0"));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<SocketAddr>() {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is not a socket address: {}", value, e),
        ));
    }
}
