//! Parsers for `wg show` machine-readable output
//!
//! `wg show <iface> dump` prints one tab-separated line for the interface
//! itself (private key, public key, listen port, fwmark) followed by one
//! line per peer:
//!
//! ```text
//! <public-key> <preshared-key> <endpoint> <allowed-ips> <latest-handshake> <rx> <tx> <keepalive>
//! ```
//!
//! Absent values are the literal `(none)` (endpoint, allowed-ips) or `off`
//! (keepalive); a `latest-handshake` of `0` means the peer has never
//! completed a handshake.

use crate::types::InterfaceName;
use crate::wg::WgError;
use crate::wg::types::RawPeer;

/// Field count of the leading interface line
const INTERFACE_FIELDS: usize = 4;

/// Field count of each peer line
const PEER_FIELDS: usize = 8;

/// Sentinel for absent endpoint / allowed-ips values
const NONE_SENTINEL: &str = "(none)";

/// Parse `wg show interfaces` output into interface names
///
/// The tool prints names separated by whitespace. Tokens that do not form a
/// valid interface name are ignored rather than failing the whole
/// enumeration.
#[must_use]
pub fn parse_interface_list(output: &str) -> Vec<InterfaceName> {
    output
        .split_whitespace()
        .filter_map(|token| InterfaceName::new(token).ok())
        .collect()
}

/// Parse `wg show <iface> dump` output into raw peer records
///
/// The leading interface line is validated for shape and skipped; every
/// remaining non-empty line must be a well-formed peer line. Returns the
/// peers in device order.
pub fn parse_device_dump(interface: &InterfaceName, output: &str) -> Result<Vec<RawPeer>, WgError> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());

    if let Some(first) = lines.next() {
        let fields: Vec<&str> = first.split('\t').collect();
        if fields.len() != INTERFACE_FIELDS {
            // A device with no interface line at all is not something wg
            // emits; treat it as corrupt output.
            return Err(parse_error(
                interface,
                format!(
                    "interface line has {} fields, expected {}",
                    fields.len(),
                    INTERFACE_FIELDS
                ),
            ));
        }
    }

    lines
        .map(|line| parse_peer_line(interface, line))
        .collect()
}

fn parse_peer_line(interface: &InterfaceName, line: &str) -> Result<RawPeer, WgError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != PEER_FIELDS {
        return Err(parse_error(
            interface,
            format!(
                "peer line has {} fields, expected {}",
                fields.len(),
                PEER_FIELDS
            ),
        ));
    }

    let endpoint = match fields[2] {
        NONE_SENTINEL => None,
        text => Some(text.parse().map_err(|_| {
            parse_error(interface, format!("invalid endpoint '{}'", text))
        })?),
    };

    let allowed_ips = match fields[3] {
        NONE_SENTINEL | "" => Vec::new(),
        list => list.split(',').map(str::to_string).collect(),
    };

    Ok(RawPeer {
        public_key: fields[0].to_string(),
        endpoint,
        allowed_ips,
        latest_handshake: parse_u64(interface, "latest-handshake", fields[4])?,
        rx_bytes: parse_u64(interface, "transfer-rx", fields[5])?,
        tx_bytes: parse_u64(interface, "transfer-tx", fields[6])?,
    })
}

fn parse_u64(interface: &InterfaceName, field: &str, text: &str) -> Result<u64, WgError> {
    text.parse().map_err(|_| {
        parse_error(interface, format!("invalid {} value '{}'", field, text))
    })
}

fn parse_error(interface: &InterfaceName, reason: String) -> WgError {
    WgError::ParseError {
        interface: interface.to_string(),
        reason,
    }
}
