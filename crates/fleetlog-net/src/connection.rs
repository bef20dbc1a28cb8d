//! Controller connection interface.
//!
//! A `ControllerClient` opens an authenticated session against a device
//! reported `Available` by discovery. The returned `ControllerSession`
//! delivers notifications on a broadcast stream and resolves event-log
//! category ids; the registry owns the session exclusively and closes it
//! (best-effort) when the device leaves the `Available` state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fleetlog_core::ControllerEvent;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::discovery::DeviceSnapshot;

/// Errors from connecting to or tearing down a controller session.
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    /// The device refused the session or the transport-level connect
    /// failed.
    #[error("connection refused: {0}")]
    Refused(String),

    /// The session was opened but the logon was rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The connect attempt did not complete within the configured bound.
    /// Treated identically to a connect failure by the registry.
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// Releasing the session failed. Swallowed by the registry; a stuck
    /// remote device must never halt the reconciliation loop.
    #[error("session disposal failed: {0}")]
    DisposeFailed(String),
}

/// The single fixed identity used to authenticate every session.
///
/// There is no authentication-policy flexibility: every controller in
/// the fleet is expected to accept the default application user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// The default application identity.
    pub fn default_user() -> Self {
        Self {
            username: "default".to_string(),
            password: String::new(),
        }
    }
}

/// Opens authenticated sessions against discovered devices.
#[async_trait]
pub trait ControllerClient: Send + Sync {
    /// Connects to the device and authenticates in one operation.
    ///
    /// The caller bounds this with a timeout; implementations do not
    /// need to enforce one themselves.
    async fn connect(
        &self,
        device: &DeviceSnapshot,
        credentials: &Credentials,
    ) -> Result<Arc<dyn ControllerSession>, ConnectError>;
}

/// A live, authenticated session with one controller.
///
/// Object-safe so the registry can own sessions from any client
/// implementation behind `Arc<dyn ControllerSession>`.
pub trait ControllerSession: Send + Sync {
    /// Subscribes to the session's notification stream.
    ///
    /// Delivery order within the stream is the transport's order;
    /// the session performs no reordering.
    fn events(&self) -> broadcast::Receiver<ControllerEvent>;

    /// Resolves an event-log category id against the session's current
    /// category table. Returns `None` when the id is unknown; the
    /// dispatcher substitutes a placeholder rather than dropping the
    /// record.
    fn lookup_category(&self, category_id: u32) -> Option<String>;

    /// Releases the session. Best-effort: callers swallow failures.
    fn close(&self) -> Result<(), ConnectError>;
}
