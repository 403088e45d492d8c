//! Default configuration values
//!
//! Centralized so serde defaults, `Default` impls and tests agree on a
//! single source of truth.

use std::time::Duration;

/// Default interval between device polls (5 seconds)
#[must_use]
pub fn scrape_interval() -> Duration {
    Duration::from_secs(5)
}

/// Default timeout for a single device query
#[must_use]
pub fn scrape_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Default listen host (all interfaces)
#[must_use]
pub fn listen_host() -> String {
    "0.0.0.0".to_string()
}
