//! Mock spectrum analyzer
//!
//! Provides a scripted device for exercising sessions without hardware. Each
//! [`MockDevice`] answers commands through a responder closure; a
//! [`MockConnector`] hands out one device per open and fails once the script
//! runs out, which looks to the session like a device that never came back.
//!
//! # Example
//!
//! ```rust,ignore
//! let device = MockDevice::new(|command| match command {
//!     DeviceCommand::RequestScale => vec![MockReply::line(scale)],
//!     DeviceCommand::RequestSample => vec![MockReply::line(sample)],
//! });
//! let connector = Arc::new(MockConnector::new(vec![device]));
//! ```

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{Connector, DeviceCommand, DeviceConnection, LineSource};
use crate::error::{DeviceError, DeviceResult};

/// How long a mock line source waits before reporting an idle poll.
const MOCK_POLL: Duration = Duration::from_millis(5);

/// One unit of device output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// A line, terminator included.
    Line(String),
    /// The read fails with an I/O error carrying this message.
    IoFailure(String),
    /// The read returns no data.
    ShortRead,
}

impl MockReply {
    /// A newline-terminated line.
    pub fn line(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Self::Line(text)
    }
}

type Responder = Box<dyn FnMut(DeviceCommand) -> Vec<MockReply> + Send>;

/// A scripted device for one connection lifetime.
pub struct MockDevice {
    responder: Responder,
    banner: Vec<MockReply>,
}

impl MockDevice {
    /// Create a device answering each command with the replies `responder` returns.
    pub fn new<F>(responder: F) -> Self
    where
        F: FnMut(DeviceCommand) -> Vec<MockReply> + Send + 'static,
    {
        Self {
            responder: Box::new(responder),
            banner: Vec::new(),
        }
    }

    /// A device that never answers.
    pub fn silent() -> Self {
        Self::new(|_| Vec::new())
    }

    /// Output emitted as soon as the device is opened, before any command.
    pub fn with_banner(mut self, banner: Vec<MockReply>) -> Self {
        self.banner = banner;
        self
    }
}

/// Hands out scripted devices, one per open.
pub struct MockConnector {
    devices: Mutex<VecDeque<MockDevice>>,
    opens: Mutex<usize>,
    commands: Arc<Mutex<Vec<(usize, DeviceCommand)>>>,
}

impl MockConnector {
    /// Create a connector that yields `devices` in order.
    pub fn new(devices: Vec<MockDevice>) -> Self {
        Self {
            devices: Mutex::new(devices.into()),
            opens: Mutex::new(0),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of open attempts so far, failed ones included.
    pub fn open_count(&self) -> usize {
        *self.opens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commands received by the device opened as the `connection`-th (1-based).
    pub fn commands_for(&self, connection: usize) -> Vec<DeviceCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(generation, _)| *generation == connection)
            .map(|(_, command)| *command)
            .collect()
    }
}

impl Connector for MockConnector {
    fn open(&self) -> DeviceResult<Box<dyn DeviceConnection>> {
        let generation = {
            let mut opens = self.opens.lock().unwrap_or_else(PoisonError::into_inner);
            *opens += 1;
            *opens
        };
        let device = self
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| DeviceError::Open {
                path: format!("mock{generation}"),
                reason: "no such device".to_string(),
            })?;

        let (output, input) = mpsc::channel();
        for reply in device.banner {
            let _ = output.send(reply);
        }

        Ok(Box::new(MockConnection {
            name: format!("mock{generation}"),
            generation,
            responder: device.responder,
            output,
            input: Some(input),
            commands: Arc::clone(&self.commands),
        }))
    }
}

struct MockConnection {
    name: String,
    generation: usize,
    responder: Responder,
    output: Sender<MockReply>,
    input: Option<Receiver<MockReply>>,
    commands: Arc<Mutex<Vec<(usize, DeviceCommand)>>>,
}

impl DeviceConnection for MockConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, command: DeviceCommand) -> DeviceResult<()> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((self.generation, command));
        for reply in (self.responder)(command) {
            // the reader may already be gone after a failure reply
            let _ = self.output.send(reply);
        }
        Ok(())
    }

    fn line_source(&mut self) -> DeviceResult<Box<dyn LineSource>> {
        let input = self.input.take().ok_or(DeviceError::ReaderStopped)?;
        Ok(Box::new(MockLineSource { input }))
    }
}

struct MockLineSource {
    input: Receiver<MockReply>,
}

impl LineSource for MockLineSource {
    fn read_line(&mut self) -> DeviceResult<Option<String>> {
        match self.input.recv_timeout(MOCK_POLL) {
            Ok(MockReply::Line(line)) => Ok(Some(line)),
            Ok(MockReply::IoFailure(message)) => Err(DeviceError::Read(std::io::Error::other(message))),
            Ok(MockReply::ShortRead) => Err(DeviceError::ShortRead),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            // connection dropped
            Err(RecvTimeoutError::Disconnected) => Err(DeviceError::ShortRead),
        }
    }
}
