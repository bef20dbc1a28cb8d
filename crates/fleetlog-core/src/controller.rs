//! Controller identity and reachability.

use std::fmt;

/// Unique identity of a networked controller (its system name).
///
/// The discovery transport reports this name with every snapshot; it is
/// the primary key for registry membership and the subject field of
/// every log record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(String);

impl ControllerId {
    /// Creates a new ControllerId from a string.
    ///
    /// Note: This does not validate the name. The discovery transport
    /// provides the system name, so we trust its format.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ControllerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Network visibility of a controller as classified by the discovery
/// transport.
///
/// `Available` is the only state in which a connection is attempted;
/// every other state evicts the controller from the registry. The
/// `Display` output is written verbatim into log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reachability {
    /// Visible and accepting connections.
    Available,

    /// Not visible on the network.
    Unavailable,

    /// Visible but refusing new sessions.
    Busy,

    /// Visible but running an incompatible system version.
    Incompatible,
}

impl Reachability {
    /// Returns true for the only state in which connecting makes sense.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
            Self::Busy => "Busy",
            Self::Incompatible => "Incompatible",
        };
        write!(f, "{label}")
    }
}
