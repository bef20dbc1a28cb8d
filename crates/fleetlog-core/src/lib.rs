//! Fleetlog Core - Shared domain types for controller event logging
//!
//! This crate provides the domain types shared between the daemon
//! (fleetlogd) and the transport layer (fleetlog-net): controller
//! identities, reachability states, controller events, and the
//! append-only log record model.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`
//! outside of tests.

pub mod controller;
pub mod event;
pub mod record;

// Re-exports for convenience
pub use controller::{ControllerId, Reachability};
pub use event::{ControllerEvent, EventLogMessage, Severity};
pub use record::{LogRecord, TIMESTAMP_FORMAT};
