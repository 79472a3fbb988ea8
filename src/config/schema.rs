//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for both services.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the origin and relay services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Origin file server settings.
    pub origin: OriginConfig,

    /// Relay service settings.
    pub relay: RelayServiceConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Origin file server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Bind address (e.g., "127.0.0.1:5001").
    pub bind_address: String,

    /// Path of the single file served by the origin.
    pub file_path: String,

    /// Filename suggested to the client in `Content-Disposition`.
    pub download_name: String,

    /// Declared content type of the file.
    pub content_type: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5001".to_string(),
            file_path: "data/smart_meter_data.csv".to_string(),
            download_name: "smart_meter_data.csv".to_string(),
            content_type: "text/csv".to_string(),
        }
    }
}

/// Relay service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayServiceConfig {
    /// Bind address (e.g., "127.0.0.1:5002").
    pub bind_address: String,

    /// Absolute URL of the origin endpoint.
    pub upstream_url: String,

    /// Upper bound on the size of each chunk forwarded downstream.
    pub chunk_size: usize,
}

impl Default for RelayServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5002".to_string(),
            upstream_url: "http://127.0.0.1:5001/api/get_smart_meter_data".to_string(),
            chunk_size: 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to return response headers, in seconds.
    /// Streaming the body is not bounded.
    pub upstream_secs: u64,

    /// Handler timeout on the origin, in seconds. The relay is bounded by
    /// `connect_secs` and `upstream_secs` instead.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_deployment() {
        let config = RelayConfig::default();
        assert_eq!(config.origin.bind_address, "127.0.0.1:5001");
        assert_eq!(config.origin.download_name, "smart_meter_data.csv");
        assert_eq!(config.origin.content_type, "text/csv");
        assert_eq!(config.relay.bind_address, "127.0.0.1:5002");
        assert_eq!(
            config.relay.upstream_url,
            "http://127.0.0.1:5001/api/get_smart_meter_data"
        );
        assert_eq!(config.relay.chunk_size, 1024);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [origin]
            file_path = "/srv/meter.csv"

            [relay]
            chunk_size = 4096

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.origin.file_path, "/srv/meter.csv");
        assert_eq!(config.origin.bind_address, "127.0.0.1:5001");
        assert_eq!(config.relay.chunk_size, 4096);
        assert_eq!(config.timeouts.connect_secs, 5);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let result: Result<RelayConfig, _> = toml::from_str(
            r#"
            [observability]
            log_format = "xml"
            "#,
        );
        assert!(result.is_err());
    }
}
