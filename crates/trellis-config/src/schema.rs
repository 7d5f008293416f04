//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults,
//! so a file only needs to mention what it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use trellis_core::DEFAULT_MAX_MEMORY;

/// Server configuration section.
///
/// # Example
///
/// ```
/// use trellis_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     request_timeout_ms: 0,
///     ..ServerConfig::default()
/// };
/// assert_eq!(config.request_timeout(), None);
/// assert_eq!(config.max_body_bytes(), Some(32 << 20));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Per-request handler timeout in milliseconds. `0` disables it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest request body accepted from a client, in bytes. `0` disables
    /// the cap. Multipart parsing and typed-handler decoding never read
    /// past it.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

impl ServerConfig {
    /// Returns the request timeout, or `None` when disabled.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    /// Returns the request body cap, or `None` when disabled.
    #[must_use]
    pub fn max_body_bytes(&self) -> Option<u64> {
        (self.max_body_bytes > 0).then_some(self.max_body_bytes)
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_MEMORY
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g., "info", "trellis_axum=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: ServerConfig = toml::from_str("request_timeout_ms = 250").unwrap();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ServerConfig, _> = toml::from_str("max_connections = 10");
        assert!(result.is_err());
    }

    #[test]
    fn test_body_cap_default_and_disable() {
        assert_eq!(ServerConfig::default().max_body_bytes(), Some(DEFAULT_MAX_MEMORY));

        let config: ServerConfig = toml::from_str("max_body_bytes = 0").unwrap();
        assert_eq!(config.max_body_bytes(), None);

        let config: ServerConfig = toml::from_str("max_body_bytes = 4096").unwrap();
        assert_eq!(config.max_body_bytes(), Some(4096));
    }

    #[test]
    fn test_log_format_serde() {
        let config: LoggingConfig = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.enabled);
    }
}
