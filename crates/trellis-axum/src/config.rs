//! Adapter configuration.

use std::time::Duration;

use trellis_config::TrellisConfig;

/// Settings applied to every request the adapter dispatches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Maximum handler run time. `None` disables the timeout.
    pub request_timeout: Option<Duration>,

    /// Largest request body read from a client, in bytes. `None` disables
    /// the cap.
    pub max_body_bytes: Option<u64>,
}

impl AdapterConfig {
    /// Creates a configuration with no request timeout and no body cap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the request body cap.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }
}

impl From<&TrellisConfig> for AdapterConfig {
    fn from(config: &TrellisConfig) -> Self {
        Self {
            request_timeout: config.server.request_timeout(),
            max_body_bytes: config.server.max_body_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_limits() {
        let config = AdapterConfig::new();
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.max_body_bytes, None);
        assert_eq!(config.with_max_body_bytes(64).max_body_bytes, Some(64));
    }

    #[test]
    fn test_from_trellis_config() {
        let mut config = TrellisConfig::default();
        config.server.request_timeout_ms = 1500;
        assert_eq!(
            AdapterConfig::from(&config).request_timeout,
            Some(Duration::from_millis(1500))
        );

        config.server.request_timeout_ms = 0;
        assert_eq!(AdapterConfig::from(&config).request_timeout, None);
    }

    #[test]
    fn test_body_cap_from_trellis_config() {
        let mut config = TrellisConfig::default();
        config.server.max_body_bytes = 2048;
        assert_eq!(AdapterConfig::from(&config).max_body_bytes, Some(2048));

        config.server.max_body_bytes = 0;
        assert_eq!(AdapterConfig::from(&config).max_body_bytes, None);
    }
}
