//! Hardware adapter implementations
//!
//! This module defines the seam between the device session and the physical
//! link: a [`Connector`] opens a [`DeviceConnection`], which accepts single-byte
//! commands and hands out one blocking [`LineSource`] for its output.

use std::fmt;

use crate::error::DeviceResult;

pub mod device_path;
pub mod line_reader;
pub mod mock;
#[cfg(feature = "instrument_serial")]
pub mod serial_adapter;

pub use device_path::resolve_device;
pub use line_reader::LineReader;
pub use mock::{MockConnector, MockDevice, MockReply};
#[cfg(feature = "instrument_serial")]
pub use serial_adapter::SerialConnector;

/// Commands understood by the spectrum analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Report the wavelength scale (`w`).
    RequestScale,
    /// Report one intensity sample (`s`).
    RequestSample,
}

impl DeviceCommand {
    /// The byte written to the port.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::RequestScale => b'w',
            Self::RequestSample => b's',
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestScale => f.write_str("request-scale"),
            Self::RequestSample => f.write_str("request-sample"),
        }
    }
}

/// Blocking producer of newline-terminated lines.
pub trait LineSource: Send + 'static {
    /// Blocks until a full line arrives or the poll interval elapses.
    ///
    /// Returns `Ok(None)` on an idle poll; any partial line is kept for the next call.
    fn read_line(&mut self) -> DeviceResult<Option<String>>;
}

/// An open device link.
pub trait DeviceConnection: Send + 'static {
    /// Name of the underlying device, for logs.
    fn name(&self) -> &str;

    /// Write a command to the device.
    fn send(&mut self, command: DeviceCommand) -> DeviceResult<()>;

    /// Detach the reading half of the link.
    fn line_source(&mut self) -> DeviceResult<Box<dyn LineSource>>;
}

/// Opens device links against a fixed selector.
pub trait Connector: Send + Sync + 'static {
    /// Open (or reopen) the device. May block.
    fn open(&self) -> DeviceResult<Box<dyn DeviceConnection>>;
}
