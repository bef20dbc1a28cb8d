//! Controller registry - reconciles discovery snapshots against live
//! connections.
//!
//! The registry owns the map from controller identity to connection
//! entry and decides, per scan, whether to connect, disconnect, or leave
//! a device untouched. Membership is mutated only by `reconcile`, called
//! from the single run-loop task; dispatcher tasks communicate solely
//! through the record channel, so there is no shared mutable state on
//! the hot path.
//!
//! # Membership invariant
//!
//! An identity appears in the registry iff it was last seen `Available`,
//! whether or not its connect attempt succeeded. A failed attempt is
//! recorded as an entry with no session - a sentinel that suppresses
//! repeated connect storms against a chronically failing device. The
//! sentinel is only evicted by a non-Available observation, after which
//! the device becomes eligible for a fresh attempt.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fleetlog_core::{ControllerId, LogRecord, Reachability};
use fleetlog_net::{
    ConnectError, ControllerClient, ControllerSession, Credentials, DeviceSnapshot,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::DaemonConfig;
use crate::dispatcher::spawn_dispatcher;

/// One known identity: its session (if the connect succeeded) and the
/// dispatcher task wired to it.
///
/// The session handle is set once at connect time and owned exclusively
/// by the entry until disposal; `None` marks "seen Available, unusable".
struct ConnectionEntry {
    session: Option<Arc<dyn ControllerSession>>,
    dispatcher: Option<tokio::task::JoinHandle<()>>,
}

/// The stateful map from device identity to connection entry.
pub struct Registry<C: ControllerClient> {
    client: C,
    credentials: Credentials,
    entries: HashMap<ControllerId, ConnectionEntry>,
    records: mpsc::Sender<LogRecord>,
    connect_timeout: Duration,
    device_pause: Duration,
}

impl<C: ControllerClient> Registry<C> {
    pub fn new(client: C, records: mpsc::Sender<LogRecord>, config: &DaemonConfig) -> Self {
        Self {
            client,
            credentials: Credentials::default_user(),
            entries: HashMap::new(),
            records,
            connect_timeout: config.connect_timeout,
            device_pause: config.device_pause,
        }
    }

    /// Diffs one discovery snapshot against current membership.
    ///
    /// Diffing against current membership (not the previous snapshot)
    /// means a device that flickered Available -> Unavailable ->
    /// Available between two scans is still handled correctly. Nothing a
    /// single device does can escape this loop; per-device errors are
    /// logged and the iteration continues.
    pub async fn reconcile(&mut self, snapshot: Vec<DeviceSnapshot>) {
        for device in snapshot {
            self.reconcile_device(&device).await;

            // Rate limit against the fleet; event callbacks keep being
            // serviced during the pause.
            if !self.device_pause.is_zero() {
                tokio::time::sleep(self.device_pause).await;
            }
        }
    }

    async fn reconcile_device(&mut self, device: &DeviceSnapshot) {
        if device.reachability.is_available() {
            // Already connected or already marked failed: no action.
            if !self.entries.contains_key(&device.id) {
                self.connect_device(device).await;
            }
        } else if let Some(entry) = self.entries.remove(&device.id) {
            self.release_entry(&device.id, entry, device.reachability)
                .await;
        }
    }

    /// Opens a session against a newly Available device and wires its
    /// dispatcher, or records the failure sentinel.
    async fn connect_device(&mut self, device: &DeviceSnapshot) {
        self.emit(LogRecord::now(vec![
            device.id.to_string(),
            device.reachability.to_string(),
            device.address.clone(),
        ]))
        .await;

        let attempt = timeout(
            self.connect_timeout,
            self.client.connect(device, &self.credentials),
        )
        .await
        .unwrap_or(Err(ConnectError::Timeout(self.connect_timeout)));

        match attempt {
            Ok(session) => {
                info!(controller = %device.id, address = %device.address, "Controller connected");
                self.emit(LogRecord::now(vec![
                    device.id.to_string(),
                    "Connected".to_string(),
                ]))
                .await;

                let dispatcher =
                    spawn_dispatcher(device.id.clone(), session.clone(), self.records.clone());
                self.entries.insert(
                    device.id.clone(),
                    ConnectionEntry {
                        session: Some(session),
                        dispatcher: Some(dispatcher),
                    },
                );
            }
            Err(e) => {
                warn!(controller = %device.id, error = %e, "Controller connect failed");
                self.emit(LogRecord::now(vec![
                    device.id.to_string(),
                    "Error".to_string(),
                    e.to_string(),
                ]))
                .await;

                // Sentinel entry: no further attempts until the device
                // cycles through a non-Available observation.
                self.entries.insert(
                    device.id.clone(),
                    ConnectionEntry {
                        session: None,
                        dispatcher: None,
                    },
                );
            }
        }
    }

    /// Removes an entry whose device left the Available state.
    ///
    /// Disposal is best-effort: a stuck remote device must not halt the
    /// loop, so close failures are swallowed and the plain reachability
    /// record is written either way.
    async fn release_entry(
        &mut self,
        id: &ControllerId,
        entry: ConnectionEntry,
        reachability: Reachability,
    ) {
        if let Some(dispatcher) = entry.dispatcher {
            dispatcher.abort();
        }

        if let Some(session) = entry.session {
            if let Err(e) = session.close() {
                debug!(controller = %id, error = %e, "Session disposal failed (ignored)");
            }
        }

        info!(controller = %id, reachability = %reachability, "Controller removed");
        self.emit(LogRecord::now(vec![
            id.to_string(),
            reachability.to_string(),
        ]))
        .await;
    }

    async fn emit(&self, record: LogRecord) {
        if self.records.send(record).await.is_err() {
            warn!("Record channel closed, log entry lost");
        }
    }

    /// True if the identity is currently a member (live or sentinel).
    pub fn contains(&self, id: &ControllerId) -> bool {
        self.entries.contains_key(id)
    }

    /// True when no identity is known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the identity is a member with an open session (not a
    /// failure sentinel).
    pub fn has_live_session(&self, id: &ControllerId) -> bool {
        self.entries
            .get(id)
            .map(|entry| entry.session.is_some())
            .unwrap_or(false)
    }
}
