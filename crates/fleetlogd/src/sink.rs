//! Log sink - console mirror and date-derived file appends.
//!
//! Every record is printed to the operator console (stdout) first and
//! then, when a log root is configured, appended to the current day's
//! file under `<root>/<yyyy>/<yyyymmdd>.csv`. The console copy is
//! unconditional, so an operator watching stdout never loses visibility
//! even when the disk fails.
//!
//! Concurrency: producers never call `write` directly. They send records
//! through one mpsc channel whose single consumer (`spawn_sink_task`)
//! performs the writes, so bytes of two records can never interleave.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use fleetlog_core::LogRecord;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Line terminator, kept CRLF for compatibility with existing log
/// consumers.
const LINE_TERMINATOR: &str = "\r\n";

/// Errors that can occur while persisting a record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The year directory could not be created.
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening or appending to the day's file failed.
    #[error("failed to append to {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Append-only writer for the record stream.
#[derive(Debug, Clone)]
pub struct LogSink {
    /// Root of the year/day hierarchy; `None` means console-only.
    root: Option<PathBuf>,
}

impl LogSink {
    /// Creates a sink writing beneath `root`, or console-only when
    /// `root` is `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Creates the root directory if missing. Called once at startup;
    /// failure here is fatal to the process (exit code -1).
    pub fn prepare_root(root: &Path) -> Result<(), SinkError> {
        std::fs::create_dir_all(root).map_err(|source| SinkError::CreateDir {
            path: root.to_path_buf(),
            source,
        })
    }

    /// True when records are persisted to files in addition to the
    /// console.
    pub fn writes_files(&self) -> bool {
        self.root.is_some()
    }

    /// Resolves the file a record written at `timestamp` lands in.
    ///
    /// Returns `None` for a console-only sink. The path is derived from
    /// local receipt time, giving the `<root>/<yyyy>/<yyyymmdd>.csv`
    /// layout with day files rotating at local midnight.
    pub fn file_path(&self, timestamp: DateTime<Local>) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let year_dir = root.join(timestamp.format("%Y").to_string());
        Some(year_dir.join(format!("{}.csv", timestamp.format("%Y%m%d"))))
    }

    /// Writes one record: console first, then the file append.
    ///
    /// Idempotent-safe on failure: a failed directory creation or append
    /// leaves no partial line behind and the console copy has already
    /// been emitted. The caller logs the error and moves on; there is no
    /// retry queue.
    pub fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = record.to_line();

        // Operator console mirror is unconditional and cannot fail
        // visibly; file persistence comes second.
        println!("{line}");

        let Some(path) = self.file_path(Local::now()) else {
            return Ok(());
        };

        if let Some(year_dir) = path.parent() {
            std::fs::create_dir_all(year_dir).map_err(|source| SinkError::CreateDir {
                path: year_dir.to_path_buf(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Append {
                path: path.clone(),
                source,
            })?;

        file.write_all(format!("{line}{LINE_TERMINATOR}").as_bytes())
            .map_err(|source| SinkError::Append { path, source })
    }
}

/// Spawns the single consumer of the record channel.
///
/// Records are written strictly in arrival order. Write failures are
/// reported to the operator log and the record is lost from the file
/// (never from the console, which `write` has already served). The task
/// ends when every producer has dropped its sender or the token is
/// cancelled.
pub fn spawn_sink_task(
    mut records: mpsc::Receiver<LogRecord>,
    sink: LogSink,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!(file_output = sink.writes_files(), "Log sink started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    // Drain whatever producers managed to queue before
                    // cancellation so no accepted record is dropped.
                    while let Ok(record) = records.try_recv() {
                        write_one(&sink, &record);
                    }
                    info!("Log sink shutting down");
                    break;
                }

                maybe = records.recv() => match maybe {
                    Some(record) => write_one(&sink, &record),
                    None => {
                        debug!("Record channel closed, sink task stopping");
                        break;
                    }
                },
            }
        }
    })
}

fn write_one(sink: &LogSink, record: &LogRecord) {
    if let Err(e) = sink.write(record) {
        warn!(error = %e, "Failed to persist log record");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(fields: &[&str]) -> LogRecord {
        LogRecord::now(fields.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn test_console_only_sink_never_fails() {
        let sink = LogSink::new(None);
        assert!(!sink.writes_files());
        assert!(sink.write(&record(&["R1", "Connected"])).is_ok());
        assert!(sink.file_path(Local::now()).is_none());
    }

    #[test]
    fn test_file_path_layout() {
        let sink = LogSink::new(Some(PathBuf::from("/var/log/fleet")));
        let ts = Local.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        let path = sink.file_path(ts).unwrap();
        assert_eq!(path, PathBuf::from("/var/log/fleet/2026/20260830.csv"));
    }

    #[test]
    fn test_write_creates_year_dir_and_appends() {
        let dir = TempDir::new().unwrap();
        let sink = LogSink::new(Some(dir.path().to_path_buf()));

        sink.write(&record(&["R1", "Available", "10.0.0.5"])).unwrap();
        sink.write(&record(&["R1", "Connected"])).unwrap();

        let path = sink.file_path(Local::now()).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.split(LINE_TERMINATOR).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(";R1;Available;10.0.0.5"));
        assert!(lines[1].ends_with(";R1;Connected"));
    }

    #[test]
    fn test_write_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let bogus_root = dir.path().join("not-a-dir");
        std::fs::write(&bogus_root, "occupied").unwrap();

        let sink = LogSink::new(Some(bogus_root));
        // The console copy has already been emitted by the time the
        // append fails; only the file half of the record is lost.
        let result = sink.write(&record(&["R1", "Connected"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_prepare_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("logs");
        LogSink::prepare_root(&root).unwrap();
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_sink_task_serializes_concurrent_producers() {
        let dir = TempDir::new().unwrap();
        let sink = LogSink::new(Some(dir.path().to_path_buf()));
        let (tx, rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();
        let task = spawn_sink_task(rx, sink.clone(), cancel.clone());

        // Many producers firing at once, as dispatcher callbacks do.
        let mut producers = Vec::new();
        for p in 0..8 {
            let tx = tx.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..25 {
                    let rec = LogRecord::now(vec![
                        format!("R{p}"),
                        "State".to_string(),
                        format!("cycle-{i}"),
                    ]);
                    tx.send(rec).await.unwrap();
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        drop(tx);
        task.await.unwrap();

        let path = sink.file_path(Local::now()).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.split(LINE_TERMINATOR).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 8 * 25);
        // Every line is one well-formed record: date;time;id;State;cycle-N
        for line in lines {
            let fields: Vec<&str> = line.split(';').collect();
            assert_eq!(fields.len(), 5, "malformed line: {line}");
            assert!(fields[2].starts_with('R'));
            assert_eq!(fields[3], "State");
            assert!(fields[4].starts_with("cycle-"));
        }
    }

    #[tokio::test]
    async fn test_sink_task_stops_on_cancel() {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let task = spawn_sink_task(rx, LogSink::new(None), cancel.clone());

        tx.send(record(&["R1", "Connected"])).await.unwrap();
        cancel.cancel();
        task.await.unwrap();
    }
}
