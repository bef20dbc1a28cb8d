//! Append-only log record model.
//!
//! A `LogRecord` is immutable once constructed and written exactly once:
//! mirrored to the operator console and appended to the day's log file.
//! The rendered line is semicolon-delimited with a local timestamp at
//! millisecond precision:
//!
//! ```text
//! 2026-08-30;14:03:07.512;R1;Available;10.0.0.5
//! ```
//!
//! Free-text fields (event titles and bodies) are double-quote-wrapped
//! by the producer but embedded quotes and semicolons are not escaped;
//! the format is preserved verbatim for compatibility with existing
//! log consumers.

use chrono::{DateTime, Local};

/// Timestamp layout used for the leading record fields.
///
/// The date and time render as two semicolon-separated fields, so a
/// record line always begins `yyyy-MM-dd;HH:mm:ss.fff;...`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d;%H:%M:%S%.3f";

/// One timestamped, append-only log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Local time the record refers to. For registry and state-change
    /// records this is receipt time; for event-log messages it is the
    /// device-reported time.
    pub timestamp: DateTime<Local>,

    /// Ordered free-form fields, joined with semicolons after the
    /// timestamp. The first field is the subject controller identity
    /// for all records except the startup record.
    pub fields: Vec<String>,
}

impl LogRecord {
    /// Creates a record stamped with the current local time.
    pub fn now(fields: Vec<String>) -> Self {
        Self::at(Local::now(), fields)
    }

    /// Creates a record with an explicit timestamp (device-reported
    /// event-log messages carry the controller's clock).
    pub fn at(timestamp: DateTime<Local>, fields: Vec<String>) -> Self {
        Self { timestamp, fields }
    }

    /// Renders the record as a single semicolon-delimited line,
    /// without a line terminator.
    pub fn to_line(&self) -> String {
        format!(
            "{};{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.fields.join(";")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_line_shape() {
        let ts = Local.with_ymd_and_hms(2026, 8, 30, 14, 3, 7).unwrap();
        let record = LogRecord::at(
            ts,
            vec!["R1".to_string(), "Available".to_string(), "10.0.0.5".to_string()],
        );
        assert_eq!(record.to_line(), "2026-08-30;14:03:07.000;R1;Available;10.0.0.5");
    }

    #[test]
    fn test_millisecond_precision() {
        let ts = Local
            .with_ymd_and_hms(2026, 8, 30, 23, 59, 59)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(512))
            .unwrap();
        let record = LogRecord::at(ts, vec!["R1".to_string(), "Connected".to_string()]);
        assert_eq!(record.to_line(), "2026-08-30;23:59:59.512;R1;Connected");
    }

    #[test]
    fn test_quoted_free_text_is_not_escaped() {
        // Compatibility: embedded quotes and semicolons pass through as-is.
        let ts = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let record = LogRecord::at(
            ts,
            vec!["R1".to_string(), "\"stop; now\"".to_string()],
        );
        assert!(record.to_line().ends_with(";R1;\"stop; now\""));
    }

    #[test]
    fn test_now_uses_current_time() {
        let before = Local::now();
        let record = LogRecord::now(vec!["Logger".to_string(), "Started".to_string()]);
        let after = Local::now();
        assert!(record.timestamp >= before && record.timestamp <= after);
    }
}
