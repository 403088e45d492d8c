//! Snapshot data model for WireGuard device state
//!
//! A [`DeviceSnapshot`] is one point-in-time read of one interface. It is
//! built by the device source, normalized into [`PeerStat`] values, folded
//! into the metrics registry, and then discarded. Nothing here is shared or
//! mutated after construction.

use std::net::SocketAddr;

use crate::types::{InterfaceName, PublicKey};
use crate::wg::WgError;

/// A peer exactly as reported by the device, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPeer {
    /// Public key text as emitted by the device
    pub public_key: String,
    /// Remote endpoint, if the peer has ever connected
    pub endpoint: Option<SocketAddr>,
    /// Allowed-IPs CIDR list
    pub allowed_ips: Vec<String>,
    /// Unix seconds of the most recent handshake; 0 means never
    pub latest_handshake: u64,
    /// Cumulative bytes received from this peer
    pub rx_bytes: u64,
    /// Cumulative bytes sent to this peer
    pub tx_bytes: u64,
}

/// One interface's peer set at a single point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub interface: InterfaceName,
    pub peers: Vec<RawPeer>,
}

impl DeviceSnapshot {
    /// Normalize the raw peers into [`PeerStat`] values, preserving order
    ///
    /// Pure function of the snapshot. Fails only when a peer's public key is
    /// not a valid 32-byte key, which indicates the device output itself is
    /// corrupt.
    pub fn to_stats(&self) -> Result<Vec<PeerStat>, WgError> {
        self.peers
            .iter()
            .map(|raw| PeerStat::from_raw(&self.interface, raw))
            .collect()
    }
}

/// Normalized per-peer statistics ready for the metrics registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerStat {
    /// Canonical base64 public key, stable across polls and restarts
    pub public_key: PublicKey,
    /// Endpoint in `ip:port` text form, if known
    pub endpoint: Option<String>,
    /// Comma-joined allowed-IPs list, empty when none configured
    pub allowed_ips: String,
    /// Unix seconds of the last handshake; `None` when the peer has never
    /// completed a handshake (distinct from a handshake at epoch zero)
    pub last_handshake: Option<u64>,
    /// Cumulative received bytes, republished as-is
    pub rx_bytes: u64,
    /// Cumulative sent bytes, republished as-is
    pub tx_bytes: u64,
}

impl PeerStat {
    fn from_raw(interface: &InterfaceName, raw: &RawPeer) -> Result<Self, WgError> {
        let public_key =
            PublicKey::new(&raw.public_key).map_err(|e| WgError::ParseError {
                interface: interface.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            public_key,
            endpoint: raw.endpoint.map(|ep| ep.to_string()),
            allowed_ips: raw.allowed_ips.join(","),
            last_handshake: (raw.latest_handshake > 0).then_some(raw.latest_handshake),
            rx_bytes: raw.rx_bytes,
            tx_bytes: raw.tx_bytes,
        })
    }
}
