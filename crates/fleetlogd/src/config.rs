//! Daemon configuration.
//!
//! There is no config file and no environment surface; these knobs exist
//! so the run loop can be tuned down to milliseconds in tests while the
//! shipped defaults match the production cadence.

use std::time::Duration;

/// Pause after handling each device during reconciliation.
///
/// Rate-limits the daemon against the discovery transport and the
/// controller fleet. Reconciliation latency therefore scales linearly
/// with fleet size; an accepted limit for the small fleets this daemon
/// targets.
pub const DEFAULT_DEVICE_PAUSE: Duration = Duration::from_secs(1);

/// Upper bound on one connect-and-authenticate attempt.
///
/// A timeout is treated identically to a connect failure, so a single
/// unresponsive device cannot stall the scan cycle.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between scan cycles, so an empty fleet does not spin the loop.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(1);

/// Buffer of the record channel between producers and the sink task.
pub const RECORD_BUFFER: usize = 256;

/// Tuning knobs threaded through the scanner, registry, and run loop.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Pause after each device handled during reconciliation.
    pub device_pause: Duration,

    /// Bound on each connect attempt; timeout counts as failure.
    pub connect_timeout: Duration,

    /// Pause between scan cycles.
    pub scan_interval: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            device_pause: DEFAULT_DEVICE_PAUSE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

impl DaemonConfig {
    /// A configuration with all pauses collapsed, for tests that drive
    /// the loop as fast as possible.
    pub fn fast() -> Self {
        Self {
            device_pause: Duration::ZERO,
            connect_timeout: Duration::from_millis(100),
            scan_interval: Duration::from_millis(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cadence() {
        let config = DaemonConfig::default();
        assert_eq!(config.device_pause, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.scan_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_fast_profile_has_no_device_pause() {
        let config = DaemonConfig::fast();
        assert!(config.device_pause.is_zero());
        assert!(config.connect_timeout < Duration::from_secs(1));
    }
}
