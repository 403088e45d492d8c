//! Configuration validation
//!
//! Most constraints are enforced by the types themselves (`InterfaceName`,
//! `Port`); this checks the remaining semantic ones before the exporter
//! starts.

use anyhow::Result;

use super::types::Config;

impl Config {
    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.scrape.interval.is_zero() {
            return Err(anyhow::anyhow!("scrape interval cannot be 0"));
        }
        if self.scrape.timeout.is_zero() {
            return Err(anyhow::anyhow!("scrape timeout cannot be 0"));
        }
        if self.scrape.timeout > self.scrape.interval {
            tracing::warn!(
                "scrape timeout ({:?}) exceeds the scrape interval ({:?}); \
                 a slow device can delay the next tick",
                self.scrape.timeout,
                self.scrape.interval
            );
        }
        if let Some(evict_after) = self.scrape.evict_after {
            if evict_after < self.scrape.interval {
                return Err(anyhow::anyhow!(
                    "evict_after ({:?}) must be at least the scrape interval ({:?})",
                    evict_after,
                    self.scrape.interval
                ));
            }
        }

        // One half of a credential pair is always a mistake, not a request
        // to run without auth.
        let half_auth = self.auth.username.is_some() != self.auth.password.is_some();
        if half_auth {
            return Err(anyhow::anyhow!(
                "auth username and password must be set together"
            ));
        }

        Ok(())
    }
}
