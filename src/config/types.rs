//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{InterfaceName, Port, duration_serde, option_duration_serde};

/// Top-level exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// HTTP endpoint settings
    #[serde(default)]
    pub exporter: ExporterConfig,
    /// Device polling settings
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// Basic-auth settings for the metrics endpoint
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExporterConfig {
    /// Host/IP to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port to listen on (default: 9011)
    pub port: Port,
}

impl ExporterConfig {
    /// Formatted listen address, e.g. `0.0.0.0:9011`
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            host: super::defaults::listen_host(),
            port: Port::default(),
        }
    }
}

/// Device polling settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Interfaces to poll; empty means discover all present devices on
    /// every tick
    pub interfaces: Vec<InterfaceName>,
    /// Interval between polls, in seconds
    #[serde(with = "duration_serde")]
    pub interval: Duration,
    /// Timeout for a single device query, in seconds
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// Drop an interface's series after it has been failing for this long,
    /// in seconds. Unset means failing interfaces keep their last published
    /// values indefinitely.
    #[serde(with = "option_duration_serde", skip_serializing_if = "Option::is_none")]
    pub evict_after: Option<Duration>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            interfaces: Vec::new(),
            interval: super::defaults::scrape_interval(),
            timeout: super::defaults::scrape_timeout(),
            evict_after: None,
        }
    }
}

/// Basic-auth settings for the metrics endpoint
///
/// Authentication is enabled only when both fields are set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthConfig {
    /// Whether basic auth is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.credentials().is_some()
    }

    /// The configured credential pair, when both halves are present
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}
