//! Fleetlog Daemon - controller discovery and event logging
//!
//! This crate provides the daemon's moving parts:
//! - `scanner` - periodic discovery probe producing device snapshots
//! - `registry` - connection registry; reconciles snapshots against
//!   current membership and owns every live session
//! - `dispatcher` - per-session task mapping controller notifications
//!   to log records
//! - `sink` - the append-only log writer and its single-consumer task
//! - `daemon` - the run loop tying scanner and registry together
//! - `config` - tuning knobs threaded through all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ snapshot ┌──────────────┐ connect/close ┌──────────────┐
//! │   Scanner    │─────────▶│   Registry   │──────────────▶│  Controller  │
//! │ (run loop)   │          │ (single      │               │  sessions    │
//! └──────────────┘          │  writer)     │               └──────┬───────┘
//!                           └──────┬───────┘                      │ events
//!                                  │ records                      ▼
//!                                  │              ┌────────────────────────┐
//!                                  └─────────────▶│ mpsc record channel    │◀── one
//!                                                 │ (sink task, serialized │    dispatcher
//!                                                 │  console + file write) │    per session
//!                                                 └────────────────────────┘
//! ```
//!
//! Registry membership is mutated only by the reconciliation loop;
//! dispatcher tasks never touch it. Every record producer feeds the one
//! mpsc channel whose single consumer serializes all writes, so two
//! records can never interleave on disk.
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate avoids `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, and `todo!()`; fallible operations
//! return `Result` or `Option` and channel closure is handled
//! gracefully.

pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod registry;
pub mod scanner;
pub mod sink;
