//! Event dispatcher - maps controller notifications to log records.
//!
//! One dispatcher task runs per live session. It consumes the session's
//! notification stream and turns every event into exactly one record on
//! the record channel, written through immediately - no buffering, no
//! coalescing. Delivery order within a session's stream is preserved
//! as-is; across sessions the interleaving is whatever arrival order
//! produces.

use std::sync::Arc;

use fleetlog_core::{ControllerEvent, ControllerId, EventLogMessage, LogRecord};
use fleetlog_net::ControllerSession;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Category name substituted when the session's category table cannot
/// resolve a message's category id. The record is never dropped over a
/// failed lookup.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Spawns the dispatcher task for one live session.
///
/// The task ends when the session's event stream closes or when the
/// registry aborts it on disconnect. A lagged receiver (events arriving
/// faster than they are drained) is logged and skipped over; the stream
/// itself continues.
pub fn spawn_dispatcher(
    id: ControllerId,
    session: Arc<dyn ControllerSession>,
    records: mpsc::Sender<LogRecord>,
) -> tokio::task::JoinHandle<()> {
    let mut events = session.events();

    tokio::spawn(async move {
        debug!(controller = %id, "Dispatcher started");

        loop {
            match events.recv().await {
                Ok(event) => {
                    let record = record_for(&id, event, session.as_ref());
                    if records.send(record).await.is_err() {
                        debug!(controller = %id, "Record channel closed, dispatcher stopping");
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(controller = %id, missed, "Dispatcher lagged, notifications lost");
                }
                Err(RecvError::Closed) => {
                    debug!(controller = %id, "Event stream closed, dispatcher stopping");
                    break;
                }
            }
        }
    })
}

/// Maps one notification to its log record.
///
/// Category resolution happens here, at dispatch time, against the
/// session's current table - a category renamed mid-session is reflected
/// correctly and is never cached long-term.
fn record_for(
    id: &ControllerId,
    event: ControllerEvent,
    session: &dyn ControllerSession,
) -> LogRecord {
    match event {
        ControllerEvent::ConnectionChanged { connected } => {
            let state = if connected { "Connected" } else { "Disconnected" };
            LogRecord::now(vec![id.to_string(), state.to_string()])
        }
        ControllerEvent::OperatingModeChanged { mode } => {
            LogRecord::now(vec![id.to_string(), "Mode".to_string(), mode])
        }
        ControllerEvent::RunStateChanged { state } => {
            LogRecord::now(vec![id.to_string(), "State".to_string(), state])
        }
        ControllerEvent::EventLogMessage(message) => message_record(id, message, session),
    }
}

/// Builds the record for a controller event-log message.
///
/// Field order matches the established file format:
/// `ts;identity;severity;category;number;#sequence;"title";"body"`.
/// The timestamp is the device-reported one, not local receipt time.
fn message_record(
    id: &ControllerId,
    message: EventLogMessage,
    session: &dyn ControllerSession,
) -> LogRecord {
    let category = session
        .lookup_category(message.category_id)
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());

    LogRecord::at(
        message.timestamp,
        vec![
            id.to_string(),
            message.severity.to_string(),
            category,
            message.number.to_string(),
            format!("#{}", message.sequence),
            format!("\"{}\"", message.title),
            format!("\"{}\"", message.body),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use fleetlog_core::{Reachability, Severity};
    use fleetlog_net::sim::SimFleet;
    use fleetlog_net::{ControllerClient, Credentials, DeviceSnapshot};

    async fn live_session(fleet: &SimFleet, id: &str) -> Arc<dyn ControllerSession> {
        let device = DeviceSnapshot::new(id, Reachability::Available, "10.0.0.5");
        fleet
            .client()
            .connect(&device, &Credentials::default_user())
            .await
            .expect("connect succeeds")
    }

    fn message(category_id: u32) -> EventLogMessage {
        EventLogMessage {
            timestamp: Local.with_ymd_and_hms(2026, 8, 30, 10, 30, 0).unwrap(),
            severity: Severity::Warning,
            category_id,
            number: 20205,
            sequence: 42,
            title: "Program stopped".to_string(),
            body: "External stop request".to_string(),
        }
    }

    #[tokio::test]
    async fn test_connection_changed_mapping() {
        let fleet = SimFleet::new();
        let session = live_session(&fleet, "R1").await;
        let id = ControllerId::new("R1");

        let record = record_for(
            &id,
            ControllerEvent::ConnectionChanged { connected: true },
            session.as_ref(),
        );
        assert_eq!(record.fields, vec!["R1", "Connected"]);

        let record = record_for(
            &id,
            ControllerEvent::ConnectionChanged { connected: false },
            session.as_ref(),
        );
        assert_eq!(record.fields, vec!["R1", "Disconnected"]);
    }

    #[tokio::test]
    async fn test_mode_and_state_mapping() {
        let fleet = SimFleet::new();
        let session = live_session(&fleet, "R1").await;
        let id = ControllerId::new("R1");

        let record = record_for(
            &id,
            ControllerEvent::OperatingModeChanged {
                mode: "Auto".to_string(),
            },
            session.as_ref(),
        );
        assert_eq!(record.fields, vec!["R1", "Mode", "Auto"]);

        let record = record_for(
            &id,
            ControllerEvent::RunStateChanged {
                state: "Running".to_string(),
            },
            session.as_ref(),
        );
        assert_eq!(record.fields, vec!["R1", "State", "Running"]);
    }

    #[tokio::test]
    async fn test_event_log_message_mapping() {
        let fleet = SimFleet::new();
        let session = live_session(&fleet, "R1").await;
        let id = ControllerId::new("R1");

        fleet
            .session(&id)
            .expect("session tracked")
            .set_category(3, "Operational");

        let record = record_for(
            &id,
            ControllerEvent::EventLogMessage(message(3)),
            session.as_ref(),
        );
        assert_eq!(
            record.fields,
            vec![
                "R1",
                "Warning",
                "Operational",
                "20205",
                "#42",
                "\"Program stopped\"",
                "\"External stop request\"",
            ]
        );
        // Device-reported timestamp carries through to the record.
        assert_eq!(
            record.to_line().split(';').nth(1),
            Some("10:30:00.000")
        );
    }

    #[tokio::test]
    async fn test_unresolvable_category_gets_placeholder() {
        let fleet = SimFleet::new();
        let session = live_session(&fleet, "R1").await;
        let id = ControllerId::new("R1");

        let record = record_for(
            &id,
            ControllerEvent::EventLogMessage(message(99)),
            session.as_ref(),
        );
        assert_eq!(record.fields.get(2).map(String::as_str), Some(UNKNOWN_CATEGORY));
    }

    #[tokio::test]
    async fn test_dispatcher_forwards_events_in_order() {
        let fleet = SimFleet::new();
        let session = live_session(&fleet, "R1").await;
        let id = ControllerId::new("R1");
        let sim = fleet.session(&id).expect("session tracked");

        let (tx, mut rx) = mpsc::channel(16);
        let task = spawn_dispatcher(id, session, tx);

        sim.emit(ControllerEvent::OperatingModeChanged {
            mode: "Auto".to_string(),
        });
        sim.emit(ControllerEvent::RunStateChanged {
            state: "Running".to_string(),
        });

        let first = rx.recv().await.expect("first record");
        assert_eq!(first.fields, vec!["R1", "Mode", "Auto"]);
        let second = rx.recv().await.expect("second record");
        assert_eq!(second.fields, vec!["R1", "State", "Running"]);

        task.abort();
    }

    #[tokio::test]
    async fn test_dispatcher_stops_when_record_channel_closes() {
        let fleet = SimFleet::new();
        let session = live_session(&fleet, "R1").await;
        let id = ControllerId::new("R1");
        let sim = fleet.session(&id).expect("session tracked");

        let (tx, rx) = mpsc::channel(1);
        let task = spawn_dispatcher(id, session, tx);
        drop(rx);

        sim.emit(ControllerEvent::RunStateChanged {
            state: "Stopped".to_string(),
        });

        // The send failure ends the task.
        task.await.expect("dispatcher exits cleanly");
    }
}
