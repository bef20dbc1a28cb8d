//! Simulated controller fleet.
//!
//! A deterministic in-memory implementation of the discovery and
//! connection traits. The fleet is scripted from the outside: tests (and
//! hardware-less daemon runs) add or remove devices, flip reachability,
//! force connect failures or hangs, and inject controller events, then
//! observe the record stream the daemon produces.
//!
//! All handles (`SimFleet`, `SimTransport`, `SimClient`) share one
//! mutex-guarded state, so a scripted change is visible to the next scan
//! or connect attempt immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fleetlog_core::{ControllerEvent, ControllerId, Reachability};
use tokio::sync::broadcast;

use crate::connection::{ConnectError, ControllerClient, ControllerSession, Credentials};
use crate::discovery::{DeviceSnapshot, DiscoveryTransport};

/// Buffer for each simulated session's event stream.
const EVENT_BUFFER: usize = 64;

/// How a scripted connect attempt behaves for one device.
#[derive(Debug, Clone, Default)]
enum ConnectBehavior {
    /// Connect succeeds and yields a live session.
    #[default]
    Succeed,

    /// Connect fails immediately with the given detail.
    Fail(String),

    /// Connect never completes (exercises the caller's timeout).
    Hang,
}

#[derive(Default)]
struct FleetState {
    devices: Vec<DeviceSnapshot>,
    connect_behavior: HashMap<ControllerId, ConnectBehavior>,
    fail_close: HashMap<ControllerId, bool>,
    sessions: HashMap<ControllerId, Arc<SimSession>>,
    connect_counts: HashMap<ControllerId, u32>,
}

/// Scripting handle for the simulated fleet.
#[derive(Clone, Default)]
pub struct SimFleet {
    inner: Arc<Mutex<FleetState>>,
}

impl SimFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the discovery side of the fleet.
    pub fn transport(&self) -> SimTransport {
        SimTransport {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns the connection side of the fleet.
    pub fn client(&self) -> SimClient {
        SimClient {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Adds a device to the scan results, or updates its reachability
    /// and address if it is already present.
    pub fn set_device(
        &self,
        id: impl Into<ControllerId>,
        reachability: Reachability,
        address: impl Into<String>,
    ) {
        let snapshot = DeviceSnapshot::new(id, reachability, address);
        let mut state = self.lock();
        if let Some(existing) = state.devices.iter_mut().find(|d| d.id == snapshot.id) {
            *existing = snapshot;
        } else {
            state.devices.push(snapshot);
        }
    }

    /// Removes a device from scan results entirely (it simply stops
    /// being reported, as opposed to being reported non-Available).
    pub fn remove_device(&self, id: &ControllerId) {
        self.lock().devices.retain(|d| &d.id != id);
    }

    /// Makes every connect attempt against the device fail with the
    /// given detail.
    pub fn fail_connects(&self, id: impl Into<ControllerId>, detail: impl Into<String>) {
        self.lock()
            .connect_behavior
            .insert(id.into(), ConnectBehavior::Fail(detail.into()));
    }

    /// Makes every connect attempt against the device hang forever.
    pub fn hang_connects(&self, id: impl Into<ControllerId>) {
        self.lock()
            .connect_behavior
            .insert(id.into(), ConnectBehavior::Hang);
    }

    /// Restores normal connect behavior for the device.
    pub fn allow_connects(&self, id: &ControllerId) {
        self.lock().connect_behavior.remove(id);
    }

    /// Makes `close()` fail on sessions opened against the device from
    /// now on.
    pub fn fail_close(&self, id: impl Into<ControllerId>) {
        self.lock().fail_close.insert(id.into(), true);
    }

    /// How many connect attempts the device has seen.
    pub fn connect_count(&self, id: &ControllerId) -> u32 {
        self.lock().connect_counts.get(id).copied().unwrap_or(0)
    }

    /// The most recently opened session for the device, if any. Used by
    /// tests to inject events and to assert disposal.
    pub fn session(&self, id: &ControllerId) -> Option<Arc<SimSession>> {
        self.lock().sessions.get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FleetState> {
        // A poisoned lock means a test panicked mid-update; the state is
        // still usable for the remaining assertions.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Discovery side of the simulated fleet.
#[derive(Clone)]
pub struct SimTransport {
    inner: Arc<Mutex<FleetState>>,
}

#[async_trait]
impl DiscoveryTransport for SimTransport {
    async fn scan(&self) -> Vec<DeviceSnapshot> {
        match self.inner.lock() {
            Ok(state) => state.devices.clone(),
            Err(poisoned) => poisoned.into_inner().devices.clone(),
        }
    }
}

/// Connection side of the simulated fleet.
#[derive(Clone)]
pub struct SimClient {
    inner: Arc<Mutex<FleetState>>,
}

#[async_trait]
impl ControllerClient for SimClient {
    async fn connect(
        &self,
        device: &DeviceSnapshot,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn ControllerSession>, ConnectError> {
        let behavior = {
            let mut state = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *state.connect_counts.entry(device.id.clone()).or_insert(0) += 1;
            state
                .connect_behavior
                .get(&device.id)
                .cloned()
                .unwrap_or_default()
        };

        match behavior {
            ConnectBehavior::Hang => std::future::pending().await,
            ConnectBehavior::Fail(detail) => Err(ConnectError::Refused(detail)),
            ConnectBehavior::Succeed => {
                let mut state = match self.inner.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                let fail_close = state.fail_close.get(&device.id).copied().unwrap_or(false);
                let session = Arc::new(SimSession::new(device.id.clone(), fail_close));
                state.sessions.insert(device.id.clone(), session.clone());
                Ok(session)
            }
        }
    }
}

/// A live simulated session.
pub struct SimSession {
    id: ControllerId,
    events_tx: broadcast::Sender<ControllerEvent>,
    categories: Mutex<HashMap<u32, String>>,
    closed: AtomicBool,
    fail_close: bool,
}

impl SimSession {
    fn new(id: ControllerId, fail_close: bool) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            id,
            events_tx,
            categories: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
            fail_close,
        }
    }

    /// Identity of the controller this session belongs to.
    pub fn id(&self) -> &ControllerId {
        &self.id
    }

    /// Delivers an event to every subscriber. Events emitted before the
    /// dispatcher subscribes are lost, exactly like a real notification
    /// stream.
    pub fn emit(&self, event: ControllerEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Adds or renames an entry in the session's category table.
    pub fn set_category(&self, category_id: u32, name: impl Into<String>) {
        if let Ok(mut categories) = self.categories.lock() {
            categories.insert(category_id, name.into());
        }
    }

    /// True once `close()` has succeeded.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ControllerSession for SimSession {
    fn events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events_tx.subscribe()
    }

    fn lookup_category(&self, category_id: u32) -> Option<String> {
        self.categories
            .lock()
            .ok()
            .and_then(|categories| categories.get(&category_id).cloned())
    }

    fn close(&self) -> Result<(), ConnectError> {
        if self.fail_close {
            return Err(ConnectError::DisposeFailed(
                "simulated disposal failure".to_string(),
            ));
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
