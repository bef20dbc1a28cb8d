//! Fleetlog Net - The seam to the controller network
//!
//! The discovery transport and the controller remote-procedure layer are
//! external collaborators; this crate specifies them as traits so the
//! daemon can be wired against either a vendor integration or the
//! in-memory simulated fleet:
//!
//! - `discovery` - `DiscoveryTransport` and the per-scan `DeviceSnapshot`
//! - `connection` - `ControllerClient` / `ControllerSession` and
//!   `ConnectError`
//! - `sim` - deterministic in-memory fleet used by tests and for running
//!   the daemon without hardware
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate avoids `.unwrap()`, `.expect()`,
//! `panic!()`, and friends; fallible operations return `Result` or
//! `Option`.

pub mod connection;
pub mod discovery;
pub mod sim;

pub use connection::{ConnectError, ControllerClient, ControllerSession, Credentials};
pub use discovery::{DeviceSnapshot, DiscoveryTransport};
