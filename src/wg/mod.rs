//! WireGuard device access
//!
//! The only place that touches the operating system's WireGuard state. The
//! [`DeviceSource`] trait is the seam between the poll loop and the OS: the
//! real implementation shells out to `wg(8)`, tests substitute a scripted
//! source.

pub mod dump;
mod error;
pub mod mock;
pub mod types;

pub use error::WgError;
pub use mock::MockDeviceSource;
pub use types::{DeviceSnapshot, PeerStat, RawPeer};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::types::InterfaceName;

/// Interface name used in errors from device enumeration, where no single
/// device is involved
const ALL_INTERFACES: &str = "*";

/// Source of WireGuard device snapshots
///
/// Every call reflects current device state; implementations must not cache
/// and must not retry. Failures are reported upward and handled by the poll
/// loop.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Enumerate the WireGuard interfaces currently present
    async fn list_interfaces(&self) -> Result<Vec<InterfaceName>, WgError>;

    /// Read one interface's full peer state
    async fn query_device(&self, interface: &InterfaceName) -> Result<DeviceSnapshot, WgError>;
}

/// [`DeviceSource`] backed by the `wg` command-line tool
///
/// Uses `wg show interfaces` for enumeration and `wg show <name> dump` for
/// per-device snapshots.
#[derive(Debug, Clone)]
pub struct WgCommandSource {
    wg_path: String,
}

impl WgCommandSource {
    /// Create a source that invokes `wg` from `$PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::with_path("wg")
    }

    /// Create a source that invokes a specific `wg` binary
    #[must_use]
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            wg_path: path.into(),
        }
    }

    async fn run_wg(&self, args: &[&str], interface: &str) -> Result<String, WgError> {
        debug!(wg = %self.wg_path, ?args, "invoking wg");

        let output = Command::new(&self.wg_path)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| WgError::QueryFailed {
                interface: interface.to_string(),
                reason: if e.kind() == std::io::ErrorKind::NotFound {
                    format!("'{}' executable not found", self.wg_path)
                } else {
                    e.to_string()
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(interface, stderr.trim()));
        }

        String::from_utf8(output.stdout).map_err(|_| WgError::QueryFailed {
            interface: interface.to_string(),
            reason: "non-UTF-8 output from wg".to_string(),
        })
    }
}

impl Default for WgCommandSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceSource for WgCommandSource {
    async fn list_interfaces(&self) -> Result<Vec<InterfaceName>, WgError> {
        let stdout = self.run_wg(&["show", "interfaces"], ALL_INTERFACES).await?;
        Ok(dump::parse_interface_list(&stdout))
    }

    async fn query_device(&self, interface: &InterfaceName) -> Result<DeviceSnapshot, WgError> {
        let stdout = self
            .run_wg(&["show", interface.as_str(), "dump"], interface.as_str())
            .await?;
        let peers = dump::parse_device_dump(interface, &stdout)?;
        Ok(DeviceSnapshot {
            interface: interface.clone(),
            peers,
        })
    }
}

/// Map a non-zero `wg` exit into the error taxonomy based on its stderr
fn classify_failure(interface: &str, stderr: &str) -> WgError {
    if stderr.contains("No such device") || stderr.contains("Unable to access interface") {
        WgError::InterfaceNotFound {
            interface: interface.to_string(),
        }
    } else if stderr.contains("Operation not permitted") || stderr.contains("Permission denied") {
        WgError::PermissionDenied {
            interface: interface.to_string(),
        }
    } else {
        WgError::QueryFailed {
            interface: interface.to_string(),
            reason: if stderr.is_empty() {
                "wg exited with an error".to_string()
            } else {
                stderr.to_string()
            },
        }
    }
}
