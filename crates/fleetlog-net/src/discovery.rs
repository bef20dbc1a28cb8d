//! Network discovery transport interface.

use async_trait::async_trait;
use fleetlog_core::{ControllerId, Reachability};

/// What the discovery transport knows about one device at scan time.
///
/// Snapshots are ephemeral: produced once per scan, consumed by the
/// registry's reconciliation step, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// Unique system name of the device.
    pub id: ControllerId,

    /// Network visibility at the moment of the scan.
    pub reachability: Reachability,

    /// Network address the device answered from.
    pub address: String,
}

impl DeviceSnapshot {
    /// Convenience constructor used throughout the daemon and tests.
    pub fn new(
        id: impl Into<ControllerId>,
        reachability: Reachability,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            reachability,
            address: address.into(),
        }
    }
}

/// The network probe used by the discovery scanner.
///
/// A scan is best-effort: implementations may be slow or fail for
/// individual devices, but must return whatever they saw rather than
/// failing the whole call. The caller's next loop iteration is the
/// retry; no retries happen inside the transport.
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    /// Probes the network and returns a snapshot of visible devices.
    async fn scan(&self) -> Vec<DeviceSnapshot>;
}
