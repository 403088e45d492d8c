//! Prometheus collector over the committed series map
//!
//! Metric families are projected from the committed state at gather time
//! instead of being mutated in place. The committed map only ever changes by
//! whole-interface replacement, so a gather racing a cycle commit sees that
//! interface's series entirely from the previous cycle or entirely from the
//! new one.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};

use crate::types::InterfaceName;
use crate::wg::PeerStat;

const HANDSHAKE_NAME: &str = "wireguard_peer_last_handshake_seconds";
const HANDSHAKE_HELP: &str = "Unix timestamp of the last handshake with the peer; absent if the peer has never handshaked";

const RECEIVED_NAME: &str = "wireguard_peer_received_bytes_total";
const RECEIVED_HELP: &str = "Cumulative bytes received from the peer, as reported by the device";

const SENT_NAME: &str = "wireguard_peer_sent_bytes_total";
const SENT_HELP: &str = "Cumulative bytes sent to the peer, as reported by the device";

const INFO_NAME: &str = "wireguard_peer_info";
const INFO_HELP: &str = "Peer endpoint and allowed-IPs metadata; value is 1 while the peer is present";

/// Collector producing the per-peer metric families
pub(crate) struct PeerCollector {
    series: Arc<DashMap<InterfaceName, Vec<PeerStat>>>,
    descs: Vec<Desc>,
}

impl PeerCollector {
    pub(crate) fn new(
        series: Arc<DashMap<InterfaceName, Vec<PeerStat>>>,
    ) -> Result<Self, prometheus::Error> {
        let peer_labels = vec!["interface".to_string(), "public_key".to_string()];
        let info_labels = vec![
            "interface".to_string(),
            "public_key".to_string(),
            "endpoint".to_string(),
            "allowed_ips".to_string(),
        ];

        let descs = vec![
            Desc::new(
                HANDSHAKE_NAME.to_string(),
                HANDSHAKE_HELP.to_string(),
                peer_labels.clone(),
                HashMap::new(),
            )?,
            Desc::new(
                RECEIVED_NAME.to_string(),
                RECEIVED_HELP.to_string(),
                peer_labels.clone(),
                HashMap::new(),
            )?,
            Desc::new(
                SENT_NAME.to_string(),
                SENT_HELP.to_string(),
                peer_labels,
                HashMap::new(),
            )?,
            Desc::new(
                INFO_NAME.to_string(),
                INFO_HELP.to_string(),
                info_labels,
                HashMap::new(),
            )?,
        ];

        Ok(Self { series, descs })
    }
}

impl Collector for PeerCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut handshake = new_family(HANDSHAKE_NAME, HANDSHAKE_HELP, MetricType::GAUGE);
        let mut received = new_family(RECEIVED_NAME, RECEIVED_HELP, MetricType::COUNTER);
        let mut sent = new_family(SENT_NAME, SENT_HELP, MetricType::COUNTER);
        let mut info = new_family(INFO_NAME, INFO_HELP, MetricType::GAUGE);

        // Snapshot the entries and sort by interface so the exposition is
        // stable across renders of identical state.
        let mut interfaces: Vec<(InterfaceName, Vec<PeerStat>)> = self
            .series
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        interfaces.sort_by(|a, b| a.0.cmp(&b.0));

        for (interface, peers) in &interfaces {
            for peer in peers {
                let labels = [
                    ("interface", interface.as_str()),
                    ("public_key", peer.public_key.as_str()),
                ];

                if let Some(ts) = peer.last_handshake {
                    handshake
                        .mut_metric()
                        .push(gauge_metric(&labels, ts as f64));
                }
                received
                    .mut_metric()
                    .push(counter_metric(&labels, peer.rx_bytes as f64));
                sent.mut_metric()
                    .push(counter_metric(&labels, peer.tx_bytes as f64));

                let info_labels = [
                    ("interface", interface.as_str()),
                    ("public_key", peer.public_key.as_str()),
                    ("endpoint", peer.endpoint.as_deref().unwrap_or("")),
                    ("allowed_ips", peer.allowed_ips.as_str()),
                ];
                info.mut_metric().push(gauge_metric(&info_labels, 1.0));
            }
        }

        [handshake, received, sent, info]
            .into_iter()
            .filter(|family| !family.get_metric().is_empty())
            .collect()
    }
}

fn new_family(name: &str, help: &str, kind: MetricType) -> MetricFamily {
    let mut family = MetricFamily::default();
    family.set_name(name.to_string());
    family.set_help(help.to_string());
    family.set_field_type(kind);
    family
}

fn labeled_metric(labels: &[(&str, &str)]) -> Metric {
    let mut metric = Metric::default();
    for (name, value) in labels {
        let mut pair = LabelPair::default();
        pair.set_name((*name).to_string());
        pair.set_value((*value).to_string());
        metric.mut_label().push(pair);
    }
    metric
}

fn gauge_metric(labels: &[(&str, &str)], value: f64) -> Metric {
    let mut metric = labeled_metric(labels);
    let mut gauge = Gauge::default();
    gauge.set_value(value);
    metric.set_gauge(gauge);
    metric
}

fn counter_metric(labels: &[(&str, &str)], value: f64) -> Metric {
    let mut metric = labeled_metric(labels);
    let mut counter = Counter::default();
    counter.set_value(value);
    metric.set_counter(counter);
    metric
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PublicKey;

    const KEY_A: &str = "HYf+yNzgj3uhARFlNy3Pawuk/yLC+WYoY2qwjjlSxxI=";

    fn sample_map() -> Arc<DashMap<InterfaceName, Vec<PeerStat>>> {
        let map = DashMap::new();
        map.insert(
            InterfaceName::new("wg0").unwrap(),
            vec![PeerStat {
                public_key: PublicKey::new(KEY_A).unwrap(),
                endpoint: None,
                allowed_ips: "10.0.0.2/32".to_string(),
                last_handshake: None,
                rx_bytes: 7,
                tx_bytes: 9,
            }],
        );
        Arc::new(map)
    }

    #[test]
    fn test_descs_cover_all_families() {
        let collector = PeerCollector::new(Arc::new(DashMap::new())).unwrap();
        assert_eq!(collector.desc().len(), 4);
    }

    #[test]
    fn test_empty_state_collects_nothing() {
        let collector = PeerCollector::new(Arc::new(DashMap::new())).unwrap();
        assert!(collector.collect().is_empty());
    }

    #[test]
    fn test_never_handshaked_omits_handshake_sample() {
        let collector = PeerCollector::new(sample_map()).unwrap();
        let families = collector.collect();

        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert!(!names.contains(&HANDSHAKE_NAME));
        assert!(names.contains(&RECEIVED_NAME));
        assert!(names.contains(&SENT_NAME));
        assert!(names.contains(&INFO_NAME));
    }

    #[test]
    fn test_counter_values_pass_through() {
        let collector = PeerCollector::new(sample_map()).unwrap();
        let families = collector.collect();

        let received = families
            .iter()
            .find(|f| f.get_name() == RECEIVED_NAME)
            .unwrap();
        assert_eq!(received.get_metric()[0].get_counter().get_value(), 7.0);

        let sent = families.iter().find(|f| f.get_name() == SENT_NAME).unwrap();
        assert_eq!(sent.get_metric()[0].get_counter().get_value(), 9.0);
    }

    #[test]
    fn test_info_labels_include_metadata() {
        let collector = PeerCollector::new(sample_map()).unwrap();
        let families = collector.collect();

        let info = families.iter().find(|f| f.get_name() == INFO_NAME).unwrap();
        let labels = info.get_metric()[0].get_label();
        let find = |name: &str| {
            labels
                .iter()
                .find(|l| l.get_name() == name)
                .map(|l| l.get_value().to_string())
        };
        assert_eq!(find("interface").as_deref(), Some("wg0"));
        assert_eq!(find("public_key").as_deref(), Some(KEY_A));
        assert_eq!(find("endpoint").as_deref(), Some(""));
        assert_eq!(find("allowed_ips").as_deref(), Some("10.0.0.2/32"));
        assert_eq!(info.get_metric()[0].get_gauge().get_value(), 1.0);
    }

    #[test]
    fn test_interfaces_sorted_in_output() {
        let map: DashMap<InterfaceName, Vec<PeerStat>> = DashMap::new();
        for name in ["wg1", "wg0"] {
            map.insert(
                InterfaceName::new(name).unwrap(),
                vec![PeerStat {
                    public_key: PublicKey::new(KEY_A).unwrap(),
                    endpoint: None,
                    allowed_ips: String::new(),
                    last_handshake: Some(1),
                    rx_bytes: 0,
                    tx_bytes: 0,
                }],
            );
        }
        let collector = PeerCollector::new(Arc::new(map)).unwrap();
        let families = collector.collect();
        let received = families
            .iter()
            .find(|f| f.get_name() == RECEIVED_NAME)
            .unwrap();
        let ifaces: Vec<&str> = received
            .get_metric()
            .iter()
            .map(|m| m.get_label()[0].get_value())
            .collect();
        assert_eq!(ifaces, vec!["wg0", "wg1"]);
    }
}
