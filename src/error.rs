//! Custom error types for the application.
//!
//! Errors are split by the layer that produces them:
//!
//! - **`DeviceError`**: failures of the serial device, from picking the device node through
//!   opening it to reading lines and writing commands. Selection and open failures are
//!   fatal; read-side failures make the session reconnect.
//! - **`SampleError`**: reasons a raw line was rejected by the validator. These never leave
//!   the session; the pending request is simply issued again.
//! - **`SessionError`**: the fatal outcome of a session. The session returns it to the
//!   caller instead of exiting the process, so `main` owns the exit policy.
//! - **`ConfigError`**: layered configuration could not be loaded or failed validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::adapters::DeviceCommand;

/// Convenience alias for results of device operations.
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Failures of the serial device link.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The by-id directory could not be listed.
    #[error("cannot list serial devices in {}: {source}", dir.display())]
    DeviceDirectory {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// More than one by-id entry matched the selector.
    #[error("conflict {first:?} vs {second:?} for selection {selector:?}")]
    AmbiguousDevice {
        /// Selector as configured.
        selector: String,
        /// First matching entry.
        first: String,
        /// Second matching entry.
        second: String,
    },

    /// No by-id entry matched the selector.
    #[error("no match for {selector:?} in {}", dir.display())]
    NoDeviceMatch {
        /// Selector as configured.
        selector: String,
        /// Directory that was scanned.
        dir: PathBuf,
    },

    /// The device node could not be opened or configured.
    #[error("failed to open {path:?}: {reason}")]
    Open {
        /// Device node path.
        path: String,
        /// Driver message.
        reason: String,
    },

    /// An I/O error while reading from the port.
    #[error("serial read error: {0}")]
    Read(#[source] std::io::Error),

    /// The port reported end of file, possibly in the middle of a line.
    #[error("short read from serial port")]
    ShortRead,

    /// A command byte could not be written.
    #[error("failed to send {command} command: {source}")]
    Command {
        /// Command being sent.
        command: DeviceCommand,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The line reader exited without reporting a failure.
    #[error("line reader stopped")]
    ReaderStopped,

    /// A blocking I/O task panicked or was cancelled.
    #[error("device I/O task failed: {0}")]
    Task(String),
}

impl DeviceError {
    /// True for errors raised while picking the device node, before any open attempt.
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            Self::DeviceDirectory { .. } | Self::AmbiguousDevice { .. } | Self::NoDeviceMatch { .. }
        )
    }
}

/// Why a line from the device was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// A comma-separated field did not parse as an integer.
    #[error("token {index} ({token:?}) is not an integer")]
    InvalidToken {
        /// Zero-based field position.
        index: usize,
        /// The offending field, untrimmed.
        token: String,
    },

    /// The line had the wrong number of fields.
    #[error("expected {expected} values, got {actual}")]
    WrongLength {
        /// Required field count.
        expected: usize,
        /// Fields actually present.
        actual: usize,
    },

    /// A scale line was not strictly ascending.
    #[error("values are not strictly ascending")]
    NotAscending,
}

/// Fatal outcome of a device session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The first open failed.
    #[error("failed to open device at startup: {0}")]
    Startup(#[source] DeviceError),

    /// Reopening after a lost connection failed.
    #[error("failed to reopen device: {0}")]
    Reconnect(#[source] DeviceError),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A layer could not be read or extracted.
    #[error("Configuration load error: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The merged values are unusable.
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}
