//! Automatic error recovery strategies.
//
// The session recovers from every in-loop failure the same way: drop the
// connection and open it again. What differs is how long it waits first.

use std::fmt;
use std::time::Duration;

use crate::error::DeviceError;

/// Why a connection had to be abandoned.
#[derive(Debug)]
pub enum Interruption {
    /// No line arrived within the watchdog timeout.
    Stale {
        /// How long the session waited.
        waited: Duration,
    },
    /// The line source or a command write failed.
    Failed(DeviceError),
}

impl Interruption {
    /// Pause before reopening.
    ///
    /// A failed read waits one period so a slow device cannot cause a tight
    /// reconnect loop. A stale link has already waited out the watchdog.
    pub fn backoff(&self, period: Duration) -> Duration {
        match self {
            Self::Stale { .. } => Duration::ZERO,
            Self::Failed(_) => period,
        }
    }
}

impl From<DeviceError> for Interruption {
    fn from(err: DeviceError) -> Self {
        Self::Failed(err)
    }
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale { waited } => write!(f, "no data for {waited:?}"),
            Self::Failed(err) => write!(f, "{err}"),
        }
    }
}
