//! Scripted [`DeviceSource`] for tests
//!
//! Lets tests drive the poll loop through arbitrary sequences of snapshots
//! and failures without any real WireGuard device.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::InterfaceName;
use crate::wg::{DeviceSnapshot, DeviceSource, RawPeer, WgError};

/// In-memory device source returning pre-scripted results
///
/// Each interface holds a FIFO of responses; every [`query_device`] call
/// consumes one. An interface with no scripted responses left reports
/// [`WgError::InterfaceNotFound`].
///
/// [`query_device`]: DeviceSource::query_device
pub struct MockDeviceSource {
    interfaces: Mutex<Result<Vec<InterfaceName>, WgError>>,
    responses: Mutex<HashMap<InterfaceName, VecDeque<Result<DeviceSnapshot, WgError>>>>,
}

impl MockDeviceSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interfaces: Mutex::new(Ok(Vec::new())),
            responses: Mutex::new(HashMap::new()),
        }
    }

    /// Set what `list_interfaces` reports
    pub fn set_interfaces(&self, interfaces: Vec<InterfaceName>) {
        *self.interfaces.lock().expect("mock lock poisoned") = Ok(interfaces);
    }

    /// Make `list_interfaces` fail
    pub fn fail_enumeration(&self, error: WgError) {
        *self.interfaces.lock().expect("mock lock poisoned") = Err(error);
    }

    /// Queue a successful snapshot for an interface
    pub fn push_snapshot(&self, interface: &InterfaceName, peers: Vec<RawPeer>) {
        self.push_result(
            interface,
            Ok(DeviceSnapshot {
                interface: interface.clone(),
                peers,
            }),
        );
    }

    /// Queue a failure for an interface
    pub fn push_error(&self, interface: &InterfaceName, error: WgError) {
        self.push_result(interface, Err(error));
    }

    fn push_result(&self, interface: &InterfaceName, result: Result<DeviceSnapshot, WgError>) {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .entry(interface.clone())
            .or_default()
            .push_back(result);
    }
}

impl Default for MockDeviceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceSource for MockDeviceSource {
    async fn list_interfaces(&self) -> Result<Vec<InterfaceName>, WgError> {
        self.interfaces.lock().expect("mock lock poisoned").clone()
    }

    async fn query_device(&self, interface: &InterfaceName) -> Result<DeviceSnapshot, WgError> {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .get_mut(interface)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(WgError::InterfaceNotFound {
                    interface: interface.to_string(),
                })
            })
    }
}
