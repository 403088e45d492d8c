//! End-to-end checks of the metrics registry: parse -> observe -> render

use wg_exporter::metrics::PeerMetrics;
use wg_exporter::types::InterfaceName;
use wg_exporter::wg::{DeviceSnapshot, RawPeer};

const KEY_A: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
const KEY_B: &str = "HYf+yNzgj3uhARFlNy3Pawuk/yLC+WYoY2qwjjlSxxI=";

fn iface(name: &str) -> InterfaceName {
    InterfaceName::new(name).unwrap()
}

fn raw_peer(key: &str, rx: u64, tx: u64, handshake: u64) -> RawPeer {
    RawPeer {
        public_key: key.to_string(),
        endpoint: Some("203.0.113.5:51820".parse().unwrap()),
        allowed_ips: vec!["10.0.0.2/32".to_string()],
        latest_handshake: handshake,
        rx_bytes: rx,
        tx_bytes: tx,
    }
}

fn commit_snapshot(metrics: &PeerMetrics, interface: &str, peers: Vec<RawPeer>) {
    let snapshot = DeviceSnapshot {
        interface: iface(interface),
        peers,
    };
    let stats = snapshot.to_stats().unwrap();
    let mut cycle = metrics.begin_cycle(iface(interface));
    for peer in stats {
        cycle.observe(peer);
    }
    cycle.commit();
}

#[test]
fn round_trip_preserves_observed_values() {
    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 100, 50, 1700000000)]);

    let output = metrics.render().unwrap();
    assert!(output.contains(&format!(
        "wireguard_peer_received_bytes_total{{interface=\"wg0\",public_key=\"{}\"}} 100",
        KEY_A
    )));
    assert!(output.contains(&format!(
        "wireguard_peer_sent_bytes_total{{interface=\"wg0\",public_key=\"{}\"}} 50",
        KEY_A
    )));
    assert!(output.contains(&format!(
        "wireguard_peer_last_handshake_seconds{{interface=\"wg0\",public_key=\"{}\"}} 1700000000",
        KEY_A
    )));
}

#[test]
fn peer_info_carries_metadata_labels() {
    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 1, 2, 3)]);

    let output = metrics.render().unwrap();
    assert!(output.contains("wireguard_peer_info{"));
    assert!(output.contains("endpoint=\"203.0.113.5:51820\""));
    assert!(output.contains("allowed_ips=\"10.0.0.2/32\""));
}

#[test]
fn never_handshaked_peer_has_no_handshake_sample() {
    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 1, 2, 0)]);

    let output = metrics.render().unwrap();
    assert!(!output.contains("wireguard_peer_last_handshake_seconds{"));
    // The peer itself is still exported
    assert!(output.contains("wireguard_peer_received_bytes_total{"));
}

#[test]
fn identical_cycles_render_identically() {
    let metrics = PeerMetrics::new().unwrap();
    let peers = vec![raw_peer(KEY_A, 100, 50, 10), raw_peer(KEY_B, 7, 8, 0)];

    commit_snapshot(&metrics, "wg0", peers.clone());
    let first = metrics.render().unwrap();

    commit_snapshot(&metrics, "wg0", peers);
    let second = metrics.render().unwrap();

    assert_eq!(first, second);
}

#[test]
fn departed_peer_disappears_after_next_cycle() {
    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 100, 50, 1)]);
    assert!(metrics.render().unwrap().contains(KEY_A));

    commit_snapshot(&metrics, "wg0", vec![]);
    let output = metrics.render().unwrap();
    assert!(!output.contains(KEY_A));
    assert!(!output.contains("wireguard_peer_received_bytes_total"));
}

#[test]
fn interfaces_are_independent() {
    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 1, 1, 1)]);
    commit_snapshot(&metrics, "wg1", vec![raw_peer(KEY_B, 2, 2, 2)]);

    // Evicting wg0's peers leaves wg1 alone
    commit_snapshot(&metrics, "wg0", vec![]);
    let output = metrics.render().unwrap();
    assert!(!output.contains(KEY_A));
    assert!(output.contains(KEY_B));
}

#[test]
fn same_key_on_two_interfaces_is_two_series() {
    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 1, 1, 1)]);
    commit_snapshot(&metrics, "wg1", vec![raw_peer(KEY_A, 2, 2, 2)]);

    let output = metrics.render().unwrap();
    assert!(output.contains(&format!(
        "wireguard_peer_received_bytes_total{{interface=\"wg0\",public_key=\"{}\"}} 1",
        KEY_A
    )));
    assert!(output.contains(&format!(
        "wireguard_peer_received_bytes_total{{interface=\"wg1\",public_key=\"{}\"}} 2",
        KEY_A
    )));
}

#[test]
fn counter_regression_is_republished_verbatim() {
    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 1000, 900, 1)]);
    // Device reset: counters start over
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 10, 9, 2)]);

    let output = metrics.render().unwrap();
    assert!(output.contains(&format!(
        "wireguard_peer_received_bytes_total{{interface=\"wg0\",public_key=\"{}\"}} 10",
        KEY_A
    )));
}

#[test]
fn concurrent_renders_see_whole_cycles() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    let metrics = PeerMetrics::new().unwrap();
    commit_snapshot(&metrics, "wg0", vec![raw_peer(KEY_A, 1, 1, 1), raw_peer(KEY_B, 2, 2, 2)]);

    let stop = Arc::new(AtomicBool::new(false));

    // Writer: alternate between a two-peer cycle and a one-peer cycle
    let writer = {
        let metrics = metrics.clone();
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut both = false;
            while !stop.load(Ordering::Relaxed) {
                let peers = if both {
                    vec![raw_peer(KEY_A, 1, 1, 1), raw_peer(KEY_B, 2, 2, 2)]
                } else {
                    vec![raw_peer(KEY_A, 9, 9, 9)]
                };
                commit_snapshot(&metrics, "wg0", peers);
                both = !both;
            }
        })
    };

    // Readers: every render must show one of the two committed states for
    // wg0, never a mixture
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let output = metrics.render().unwrap();
                    let has_a = output.contains(KEY_A);
                    let has_b = output.contains(KEY_B);
                    // KEY_A is present in both states; KEY_B only in the
                    // two-peer state. A render with neither key would be a
                    // torn (empty) intermediate state.
                    assert!(has_a, "render lost the always-present peer");
                    if has_b {
                        assert!(
                            output.contains(&format!(
                                "wireguard_peer_received_bytes_total{{interface=\"wg0\",public_key=\"{}\"}} 1",
                                KEY_A
                            )),
                            "mixed series from two different cycles"
                        );
                    }
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}
