//! Serial link to the spectrum analyzer.

use std::io::Write;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::debug;

use super::{resolve_device, Connector, DeviceCommand, DeviceConnection, LineReader, LineSource};
use crate::config::DeviceConfig;
use crate::error::{DeviceError, DeviceResult};

/// Serial connector for the spectrum analyzer
///
/// Resolves the configured selector on every open, so a device that comes back
/// under a different `ttyUSB*` node is still found through its by-id link.
#[derive(Clone, Debug)]
pub struct SerialConnector {
    config: DeviceConfig,
}

impl SerialConnector {
    /// Create a connector for the given device settings.
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }
}

impl Connector for SerialConnector {
    fn open(&self) -> DeviceResult<Box<dyn DeviceConnection>> {
        let path = resolve_device(&self.config.selector, &self.config.by_id_dir)?;
        let path = path.to_string_lossy().into_owned();

        // serialport puts the tty in raw, non-canonical mode on open
        let mut port = serialport::new(path.as_str(), self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.config.poll_interval)
            .open()
            .map_err(|e| DeviceError::Open {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        reset(port.as_mut(), self.config.reset_pulse).map_err(|e| DeviceError::Open {
            path: path.clone(),
            reason: format!("reset pulse failed: {e}"),
        })?;

        debug!(
            "Serial port '{}' opened at {} baud",
            path, self.config.baud_rate
        );

        Ok(Box::new(SerialConnection { path, port }))
    }
}

/// Toggle DTR to force the device into a known state.
fn reset(port: &mut dyn SerialPort, pulse: Duration) -> serialport::Result<()> {
    port.write_data_terminal_ready(false)?;
    std::thread::sleep(pulse);
    port.write_data_terminal_ready(true)
}

struct SerialConnection {
    path: String,
    port: Box<dyn SerialPort>,
}

impl DeviceConnection for SerialConnection {
    fn name(&self) -> &str {
        &self.path
    }

    fn send(&mut self, command: DeviceCommand) -> DeviceResult<()> {
        self.port
            .write_all(&[command.as_byte()])
            .and_then(|()| self.port.flush())
            .map_err(|source| DeviceError::Command { command, source })?;
        debug!("Sent serial command: {}", command);
        Ok(())
    }

    fn line_source(&mut self) -> DeviceResult<Box<dyn LineSource>> {
        let reader = self.port.try_clone().map_err(|e| DeviceError::Open {
            path: self.path.clone(),
            reason: format!("cannot clone port for reading: {e}"),
        })?;
        Ok(Box::new(LineReader::with_capacity(4096, reader)))
    }
}
