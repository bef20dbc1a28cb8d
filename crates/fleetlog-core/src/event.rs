//! Controller event model.
//!
//! A live session delivers four kinds of notifications: connection-state
//! changes, operating-mode changes, run-state changes, and structured
//! event-log messages written by the controller itself. The dispatcher
//! maps each notification to exactly one log record.

use std::fmt;

use chrono::{DateTime, Local};

/// Severity of an event-log message as reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
        };
        write!(f, "{label}")
    }
}

/// A structured event-log message emitted by a controller.
///
/// The timestamp is device-reported, not local receipt time; the log
/// record for this message carries the device clock. The category id is
/// resolved against the session's category table at dispatch time.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLogMessage {
    /// Device-reported time of the event.
    pub timestamp: DateTime<Local>,

    /// Severity class of the message.
    pub severity: Severity,

    /// Category table key; resolved to a name at dispatch time.
    pub category_id: u32,

    /// Numeric message code.
    pub number: i32,

    /// Device-assigned sequence number within the event log.
    pub sequence: u64,

    /// Short free-text title.
    pub title: String,

    /// Free-text body.
    pub body: String,
}

/// A notification delivered on a live controller session.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The session's link to the controller went up or down.
    ConnectionChanged {
        /// True when the link is (re)established, false when lost.
        connected: bool,
    },

    /// The controller switched operating mode (e.g. automatic/manual).
    OperatingModeChanged {
        /// Name of the new mode as reported by the controller.
        mode: String,
    },

    /// The controller's run state changed (e.g. running/stopped).
    RunStateChanged {
        /// Name of the new state as reported by the controller.
        state: String,
    },

    /// A message was written to the controller's event log.
    EventLogMessage(EventLogMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Information.to_string(), "Information");
        assert_eq!(Severity::Warning.to_string(), "Warning");
        assert_eq!(Severity::Error.to_string(), "Error");
    }

    #[test]
    fn test_event_variants_clone() {
        let event = ControllerEvent::ConnectionChanged { connected: true };
        assert_eq!(event.clone(), event);

        let event = ControllerEvent::EventLogMessage(EventLogMessage {
            timestamp: Local::now(),
            severity: Severity::Warning,
            category_id: 3,
            number: 20205,
            sequence: 17,
            title: "Program stopped".to_string(),
            body: "Task t_rob1 stopped".to_string(),
        });
        assert_eq!(event.clone(), event);
    }
}
