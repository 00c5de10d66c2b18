//! Core library for the bluespx spectrum monitor.
//!
//! This library polls a Spectryx Blue visual spectrum analyzer over a serial
//! link, validates its comma-separated output and publishes the latest
//! wavelength scale and intensity sample for the HTTP front end.

pub mod adapters;
pub mod config;
pub mod data;
pub mod error;
pub mod error_recovery;
pub mod logging;
pub mod measurement;
pub mod server;
pub mod session;

pub use adapters::{Connector, DeviceCommand};
pub use config::Settings;
pub use data::SnapshotStore;
pub use error::{DeviceError, SessionError};
pub use measurement::SampleVector;
pub use session::DeviceSession;
