//! Client configuration.

use std::time::Duration;

/// Default bound on every remote call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Named connector endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addresses {
    /// Default API context.
    pub default: String,
    /// Management API, used for every call this client makes.
    pub management: String,
    /// Dataspace protocol endpoint.
    pub protocol: String,
    /// Public data plane endpoint.
    pub public: String,
    /// Control plane endpoint.
    pub control: String,
}

/// Everything needed to talk to one connector.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// API key sent with every request.
    pub token: String,
    /// Connector endpoints.
    pub addresses: Addresses,
    /// Bound on every remote call.
    pub timeout: Duration,
}

impl Config {
    /// Create a configuration with the default timeout.
    pub fn new(token: impl Into<String>, addresses: Addresses) -> Self {
        Self {
            token: token.into(),
            addresses,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Management API base URL without a trailing slash.
    #[must_use]
    pub fn management_base(&self) -> &str {
        self.addresses.management.trim_end_matches('/')
    }
}

// The token must never end up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("addresses", &self.addresses)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_management_base_trims_slash() {
        let config = Config::new(
            "t",
            Addresses {
                management: "http://localhost:19193/api/v1/data/".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(config.management_base(), "http://localhost:19193/api/v1/data");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::new("secret-token", Addresses::default());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_timeout_builder() {
        let config = Config::new("t", Addresses::default()).timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            Config::new("t", Addresses::default()).timeout,
            DEFAULT_TIMEOUT
        );
    }
}
