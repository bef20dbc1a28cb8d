//! Discovery scanner - periodic network probe.
//!
//! Thin wrapper over the discovery transport. A scan is best-effort:
//! the transport may be slow or see only part of the fleet, but the
//! scanner always returns a usable snapshot; the next loop iteration is
//! the retry.

use std::collections::HashSet;

use fleetlog_net::{DeviceSnapshot, DiscoveryTransport};
use tracing::debug;

/// Probes the network once per run-loop iteration.
pub struct Scanner<D: DiscoveryTransport> {
    transport: D,
}

impl<D: DiscoveryTransport> Scanner<D> {
    pub fn new(transport: D) -> Self {
        Self { transport }
    }

    /// Returns a snapshot of currently visible devices.
    ///
    /// Duplicate identities within one probe are collapsed (first
    /// occurrence wins) so the registry sees each identity at most once
    /// per reconciliation.
    pub async fn scan(&self) -> Vec<DeviceSnapshot> {
        let raw = self.transport.scan().await;

        let mut seen = HashSet::new();
        let snapshot: Vec<DeviceSnapshot> = raw
            .into_iter()
            .filter(|device| seen.insert(device.id.clone()))
            .collect();

        debug!(devices = snapshot.len(), "Discovery scan complete");
        snapshot
    }
}
