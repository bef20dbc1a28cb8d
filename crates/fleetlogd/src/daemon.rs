//! Daemon run loop.
//!
//! The explicit context object tying the collaborators together: one
//! sequential loop of scan -> reconcile, interleaved with the dispatcher
//! tasks and the sink task running on the runtime. Production never
//! cancels the loop (the process runs until externally terminated);
//! tests use the token to stop it cleanly.

use fleetlog_core::LogRecord;
use fleetlog_net::{ControllerClient, DiscoveryTransport};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::DaemonConfig;
use crate::registry::Registry;
use crate::scanner::Scanner;

/// The daemon context: scanner, registry, and loop cadence.
pub struct Daemon<D: DiscoveryTransport, C: ControllerClient> {
    scanner: Scanner<D>,
    registry: Registry<C>,
    config: DaemonConfig,
}

impl<D: DiscoveryTransport, C: ControllerClient> Daemon<D, C> {
    /// Wires the context from its collaborators. `records` is the
    /// producer side of the channel consumed by the sink task.
    pub fn new(
        transport: D,
        client: C,
        records: mpsc::Sender<LogRecord>,
        config: DaemonConfig,
    ) -> Self {
        let registry = Registry::new(client, records, &config);
        Self {
            scanner: Scanner::new(transport),
            registry,
            config,
        }
    }

    /// Runs the discovery/reconciliation loop until cancelled.
    ///
    /// Each iteration scans once and reconciles the snapshot; nothing a
    /// single device does can break out of the loop. Event callbacks
    /// keep being serviced between and during iterations.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("Controller discovery loop started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Discovery loop stopping");
                    break;
                }

                snapshot = self.scanner.scan() => {
                    self.registry.reconcile(snapshot).await;
                }
            }

            if !self.config.scan_interval.is_zero() {
                tokio::time::sleep(self.config.scan_interval).await;
            }
        }
    }
}
