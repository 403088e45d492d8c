//! Background poll loop
//!
//! One dedicated task walks the interface set on a fixed interval, reads
//! each device through the [`DeviceSource`], and folds the result into the
//! metrics registry. Each interface is an independent unit of work: a
//! failing device is logged and skipped, its previously published series
//! stay untouched, and the loop moves on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::ScrapeConfig;
use crate::metrics::PeerMetrics;
use crate::types::InterfaceName;
use crate::wg::{DeviceSource, WgError};

/// Periodic scraper of WireGuard device statistics
pub struct Scraper {
    source: Arc<dyn DeviceSource>,
    metrics: PeerMetrics,
    config: ScrapeConfig,
    /// Completion time of the last successful cycle per interface, used by
    /// the optional staleness eviction
    last_success: HashMap<InterfaceName, Instant>,
}

impl Scraper {
    #[must_use]
    pub fn new(source: Arc<dyn DeviceSource>, metrics: PeerMetrics, config: ScrapeConfig) -> Self {
        Self {
            source,
            metrics,
            config,
            last_success: HashMap::new(),
        }
    }

    /// Run the poll loop forever
    ///
    /// Intended to be spawned as its own task; it only ends when the task is
    /// dropped at shutdown.
    pub async fn run(mut self) {
        if self.config.interfaces.is_empty() {
            info!(
                interval = ?self.config.interval,
                "scraping all present WireGuard interfaces"
            );
        } else {
            info!(
                interval = ?self.config.interval,
                interfaces = ?self.config.interfaces,
                "scraping configured WireGuard interfaces"
            );
        }

        let mut ticker = time::interval(self.config.interval);
        loop {
            ticker.tick().await;
            self.scrape_all().await;
        }
    }

    /// Poll every target interface once
    pub async fn scrape_all(&mut self) {
        let interfaces = match self.target_interfaces().await {
            Ok(interfaces) => interfaces,
            Err(err) => {
                // No new information about any device; leave everything as
                // it was and try again next tick.
                warn!(error = %err, "failed to enumerate WireGuard interfaces");
                return;
            }
        };

        if interfaces.is_empty() {
            debug!("no WireGuard interfaces present");
        }

        for interface in &interfaces {
            match self.scrape_interface(interface).await {
                Ok(peer_count) => {
                    self.last_success.insert(interface.clone(), Instant::now());
                    debug!(%interface, peer_count, "poll cycle committed");
                }
                Err(err) => {
                    self.metrics.record_scrape_error(interface);
                    log_poll_failure(&err);
                    self.maybe_evict_stale(interface);
                }
            }
        }
    }

    /// The interface set for this tick: configured list, or live discovery
    /// when the list is empty
    async fn target_interfaces(&self) -> Result<Vec<InterfaceName>, WgError> {
        if self.config.interfaces.is_empty() {
            self.source.list_interfaces().await
        } else {
            Ok(self.config.interfaces.clone())
        }
    }

    /// Query, normalize and commit one interface
    ///
    /// A commit only happens when the whole snapshot was read and parsed;
    /// any failure leaves the interface's published series untouched.
    async fn scrape_interface(&self, interface: &InterfaceName) -> Result<usize, WgError> {
        let snapshot = time::timeout(self.config.timeout, self.source.query_device(interface))
            .await
            .map_err(|_| WgError::QueryFailed {
                interface: interface.to_string(),
                reason: format!("device query timed out after {:?}", self.config.timeout),
            })??;

        let stats = snapshot.to_stats()?;

        let mut cycle = self.metrics.begin_cycle(interface.clone());
        for peer in stats {
            cycle.observe(peer);
        }
        Ok(cycle.commit())
    }

    /// Evict an interface's series once it has been failing longer than the
    /// configured threshold
    fn maybe_evict_stale(&mut self, interface: &InterfaceName) {
        let Some(threshold) = self.config.evict_after else {
            return;
        };

        let stale = self
            .last_success
            .get(interface)
            .is_none_or(|at| at.elapsed() >= threshold);
        if !stale {
            return;
        }

        let evicted = self.metrics.evict_interface(interface);
        if evicted > 0 {
            warn!(
                %interface,
                evicted,
                threshold = ?threshold,
                "interface kept failing, dropped its stale series"
            );
        }
    }
}

/// Log a per-interface poll failure at the severity the error deserves
fn log_poll_failure(err: &WgError) {
    let interface = err.interface();
    match err.log_level() {
        tracing::Level::ERROR => error!(interface, error = %err, "interface poll failed"),
        tracing::Level::WARN => warn!(interface, error = %err, "interface poll failed"),
        _ => debug!(interface, error = %err, "interface poll failed"),
    }
}
