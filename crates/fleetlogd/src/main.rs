//! fleetlogd - controller fleet event logger
//!
//! Long-running unattended daemon: discovers networked controllers,
//! keeps a session open to each reachable one, and appends every state
//! transition and event-log message to the day's log file while
//! mirroring it to the console.
//!
//! # Usage
//!
//! ```bash
//! # Log to console only
//! fleetlogd
//!
//! # Log to console and to <root>/<yyyy>/<yyyymmdd>.csv
//! fleetlogd /var/log/fleet
//!
//! # Enable debug diagnostics (separate from the record stream)
//! RUST_LOG=fleetlogd=debug fleetlogd /var/log/fleet
//! ```
//!
//! # Exit codes
//!
//! - `-1` - the log root directory could not be created
//! - `-2` - the startup write probe failed
//! - `0` is never reached: the loop runs until external termination.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetlog_core::LogRecord;
use fleetlog_net::sim::SimFleet;
use fleetlogd::config::{DaemonConfig, RECORD_BUFFER};
use fleetlogd::daemon::Daemon;
use fleetlogd::sink::{spawn_sink_task, LogSink};

/// fleetlog daemon - controller discovery and event logging
#[derive(Parser, Debug)]
#[command(name = "fleetlogd", version, about)]
struct Args {
    /// Root directory for log files; records go to the console only
    /// when omitted.
    log_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to the tracing subscriber (stderr); the record
    // stream itself is printed to stdout by the sink.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("fleetlogd=info".parse()?)
                .add_directive("fleetlog_core=info".parse()?)
                .add_directive("fleetlog_net=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "fleetlog daemon starting"
    );

    if let Some(root) = &args.log_root {
        if let Err(e) = LogSink::prepare_root(root) {
            eprintln!("Can not create log folder in '{}': {e}", root.display());
            process::exit(-1);
        }
    }

    let sink = LogSink::new(args.log_root.clone());

    // Startup probe: the first record both announces the daemon and
    // proves the log file is writable before entering the loop.
    let started = LogRecord::now(vec!["Logger".to_string(), "Started".to_string()]);
    if let Err(e) = sink.write(&started) {
        eprintln!("Can not write to log file: {e}");
        process::exit(-2);
    }

    let (records_tx, records_rx) = mpsc::channel(RECORD_BUFFER);
    let cancel = CancellationToken::new();
    let _sink_task = spawn_sink_task(records_rx, sink, cancel.clone());

    // The vendor discovery/connection integration plugs in here through
    // the DiscoveryTransport and ControllerClient traits; the shipped
    // binary wires the (initially empty) simulated fleet so the daemon
    // can run without hardware.
    let fleet = SimFleet::new();
    let daemon = Daemon::new(
        fleet.transport(),
        fleet.client(),
        records_tx,
        DaemonConfig::default(),
    );

    // No shutdown path by design: the token is never cancelled and the
    // loop runs until the process is externally terminated.
    daemon.run(cancel).await;

    Ok(())
}
