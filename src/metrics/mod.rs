//! Peer metrics registry
//!
//! Process-wide, concurrency-safe store of the last committed peer
//! statistics per interface, exposed in Prometheus text format.
//!
//! The poll loop is the single writer: it opens a cycle per interface,
//! observes the peers found in that poll, and commits. A commit atomically
//! replaces the interface's whole series set, so peers absent from the new
//! snapshot vanish in the same step (stale-series eviction) and concurrent
//! readers see either the previous cycle's state or the new one, never a
//! half-applied mix. An uncommitted cycle (query failed mid-way) changes
//! nothing.

mod collector;

use std::sync::Arc;

use dashmap::DashMap;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::types::InterfaceName;
use crate::wg::PeerStat;

use collector::PeerCollector;

/// Shared committed state: interface -> series set from its last
/// successful cycle
type SeriesMap = Arc<DashMap<InterfaceName, Vec<PeerStat>>>;

/// Registry of per-peer WireGuard metrics
///
/// Cheap to clone; clones share the same underlying state.
#[derive(Clone)]
pub struct PeerMetrics {
    registry: Registry,
    series: SeriesMap,
    scrape_errors: IntCounterVec,
}

impl PeerMetrics {
    /// Create an empty registry with all metric families registered
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let series: SeriesMap = Arc::new(DashMap::new());

        let scrape_errors = IntCounterVec::new(
            Opts::new(
                "wireguard_scrape_errors_total",
                "Number of failed polls of a WireGuard interface",
            ),
            &["interface"],
        )?;
        registry.register(Box::new(scrape_errors.clone()))?;
        registry.register(Box::new(PeerCollector::new(Arc::clone(&series))?))?;

        Ok(Self {
            registry,
            series,
            scrape_errors,
        })
    }

    /// Open an update cycle for one interface's poll result
    ///
    /// Nothing becomes visible to readers until [`CycleHandle::commit`];
    /// dropping the handle discards the cycle.
    #[must_use]
    pub fn begin_cycle(&self, interface: InterfaceName) -> CycleHandle<'_> {
        CycleHandle {
            metrics: self,
            interface,
            peers: Vec::new(),
        }
    }

    /// Count a failed poll for an interface
    pub fn record_scrape_error(&self, interface: &InterfaceName) {
        self.scrape_errors
            .with_label_values(&[interface.as_str()])
            .inc();
    }

    /// Drop every series belonging to an interface
    ///
    /// Used by the poll loop's staleness eviction; a normal cycle commit
    /// already evicts departed peers on its own.
    pub fn evict_interface(&self, interface: &InterfaceName) -> usize {
        self.series
            .remove(interface)
            .map(|(_, peers)| peers.len())
            .unwrap_or(0)
    }

    /// Number of committed series for an interface
    #[must_use]
    pub fn peer_count(&self, interface: &InterfaceName) -> usize {
        self.series.get(interface).map(|p| p.len()).unwrap_or(0)
    }

    /// Render the current state in Prometheus text exposition format
    ///
    /// Safe to call from any number of tasks concurrently with an in-flight
    /// cycle; the reader never blocks on a device query.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// In-progress update transaction for a single interface
///
/// Accumulates the peers observed during one poll; [`commit`](Self::commit)
/// publishes them as the interface's new series set.
pub struct CycleHandle<'a> {
    metrics: &'a PeerMetrics,
    interface: InterfaceName,
    peers: Vec<PeerStat>,
}

impl CycleHandle<'_> {
    /// Record one peer seen in this cycle
    pub fn observe(&mut self, peer: PeerStat) {
        // Counter regressions happen on device resets; the raw value is
        // republished either way.
        if let Some(committed) = self.metrics.series.get(&self.interface) {
            if let Some(prev) = committed
                .iter()
                .find(|p| p.public_key == peer.public_key)
            {
                if peer.rx_bytes < prev.rx_bytes || peer.tx_bytes < prev.tx_bytes {
                    debug!(
                        interface = %self.interface,
                        public_key = %peer.public_key,
                        "byte counters regressed since last cycle"
                    );
                }
            }
        }
        self.peers.push(peer);
    }

    /// Publish this cycle, replacing the interface's previous series set
    ///
    /// Returns the number of series now exported for the interface. Any
    /// previously committed peer not observed in this cycle is gone after
    /// this call.
    pub fn commit(self) -> usize {
        let count = self.peers.len();
        self.metrics.series.insert(self.interface, self.peers);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "HYf+yNzgj3uhARFlNy3Pawuk/yLC+WYoY2qwjjlSxxI=";

    fn iface(name: &str) -> InterfaceName {
        InterfaceName::new(name).unwrap()
    }

    fn peer(key: &str, rx: u64, tx: u64, handshake: Option<u64>) -> PeerStat {
        PeerStat {
            public_key: crate::types::PublicKey::new(key).unwrap(),
            endpoint: Some("203.0.113.5:51820".to_string()),
            allowed_ips: "10.0.0.2/32".to_string(),
            last_handshake: handshake,
            rx_bytes: rx,
            tx_bytes: tx,
        }
    }

    #[test]
    fn test_commit_publishes_series() {
        let metrics = PeerMetrics::new().unwrap();
        let mut cycle = metrics.begin_cycle(iface("wg0"));
        cycle.observe(peer(KEY_A, 100, 50, Some(1700000000)));
        assert_eq!(cycle.commit(), 1);

        let output = metrics.render().unwrap();
        assert!(output.contains("wireguard_peer_received_bytes_total"));
        assert!(output.contains(&format!("public_key=\"{}\"", KEY_A)));
        assert!(output.contains("100"));
    }

    #[test]
    fn test_uncommitted_cycle_is_invisible() {
        let metrics = PeerMetrics::new().unwrap();
        let mut cycle = metrics.begin_cycle(iface("wg0"));
        cycle.observe(peer(KEY_A, 100, 50, None));
        drop(cycle);

        assert_eq!(metrics.peer_count(&iface("wg0")), 0);
        let output = metrics.render().unwrap();
        assert!(!output.contains(KEY_A));
    }

    #[test]
    fn test_empty_commit_evicts_all() {
        let metrics = PeerMetrics::new().unwrap();
        let mut cycle = metrics.begin_cycle(iface("wg0"));
        cycle.observe(peer(KEY_A, 100, 50, Some(1)));
        cycle.commit();
        assert_eq!(metrics.peer_count(&iface("wg0")), 1);

        let cycle = metrics.begin_cycle(iface("wg0"));
        assert_eq!(cycle.commit(), 0);
        assert_eq!(metrics.peer_count(&iface("wg0")), 0);
        assert!(!metrics.render().unwrap().contains(KEY_A));
    }

    #[test]
    fn test_evict_interface() {
        let metrics = PeerMetrics::new().unwrap();
        let mut cycle = metrics.begin_cycle(iface("wg0"));
        cycle.observe(peer(KEY_A, 1, 2, None));
        cycle.commit();

        assert_eq!(metrics.evict_interface(&iface("wg0")), 1);
        assert_eq!(metrics.evict_interface(&iface("wg0")), 0);
        assert_eq!(metrics.peer_count(&iface("wg0")), 0);
    }

    #[test]
    fn test_scrape_errors_counter() {
        let metrics = PeerMetrics::new().unwrap();
        metrics.record_scrape_error(&iface("wg1"));
        metrics.record_scrape_error(&iface("wg1"));

        let output = metrics.render().unwrap();
        assert!(output.contains("wireguard_scrape_errors_total{interface=\"wg1\"} 2"));
    }

    #[test]
    fn test_clone_shares_state() {
        let metrics = PeerMetrics::new().unwrap();
        let clone = metrics.clone();

        let mut cycle = metrics.begin_cycle(iface("wg0"));
        cycle.observe(peer(KEY_A, 1, 2, None));
        cycle.commit();

        assert_eq!(clone.peer_count(&iface("wg0")), 1);
    }
}
