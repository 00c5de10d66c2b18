//! Device session: the read/validate/publish loop.
//!
//! A session owns exactly one device link at a time. Each link has two halves:
//!
//! - a blocking reader task that pulls lines from the [`LineSource`] into a
//!   small bounded channel, and reports a read failure out of band on a
//!   oneshot channel before it exits;
//! - the session task, which waits on failure, the next line or the watchdog,
//!   validates the line for the current [`Phase`], publishes it, and issues the
//!   next request after one sampling period.
//!
//! The first ascending 640-value line of a connection becomes the wavelength
//! scale; from then on every 640-value line is an intensity sample. Rejected
//! lines only cause the pending request to be issued again.
//!
//! Any failure or a watchdog expiry drops the link and opens a new one. The
//! published scale survives until the new connection captures its own. If the
//! device cannot be reopened, [`DeviceSession::run`] returns
//! [`SessionError::Reconnect`] and leaves the exit policy to the caller.

use std::convert::Infallible;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::adapters::{Connector, DeviceCommand, DeviceConnection, LineSource};
use crate::config::SamplingConfig;
use crate::data::SnapshotStore;
use crate::error::{DeviceError, DeviceResult, SessionError};
use crate::error_recovery::Interruption;
use crate::measurement::{parse_line, SampleVector};

/// What the session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No scale yet on this connection.
    AwaitingScale,
    /// Scale captured; sampling continuously.
    AwaitingSample,
}

impl Phase {
    /// The request issued while in this phase.
    pub fn command(self) -> DeviceCommand {
        match self {
            Self::AwaitingScale => DeviceCommand::RequestScale,
            Self::AwaitingSample => DeviceCommand::RequestSample,
        }
    }

    /// Whether lines must be strictly ascending to be accepted.
    pub fn requires_ascending(self) -> bool {
        matches!(self, Self::AwaitingScale)
    }
}

/// A running connection to the spectrum analyzer.
pub struct DeviceSession {
    core: SessionCore,
    link: DeviceLink,
}

struct SessionCore {
    connector: Arc<dyn Connector>,
    config: SamplingConfig,
    store: SnapshotStore,
}

struct DeviceLink {
    name: String,
    /// Write half; commands are sent under this lock.
    ///
    /// Separate from the [`SnapshotStore`] lock, so HTTP readers never wait on a
    /// serial write. Publishing a vector and sending the next command stay
    /// ordered because only this session task does either.
    connection: Arc<Mutex<Box<dyn DeviceConnection>>>,
    lines: mpsc::Receiver<String>,
    failure: oneshot::Receiver<DeviceError>,
    reader: JoinHandle<()>,
}

impl DeviceSession {
    /// Open the device for the first time.
    ///
    /// # Errors
    /// [`SessionError::Startup`] if the device cannot be selected or opened.
    pub async fn open(
        connector: Arc<dyn Connector>,
        config: SamplingConfig,
        store: SnapshotStore,
    ) -> Result<Self, SessionError> {
        let core = SessionCore {
            connector,
            config,
            store,
        };
        let link = core.open_link().await.map_err(SessionError::Startup)?;
        info!(device = %link.name, "device opened");
        Ok(Self { core, link })
    }

    /// The store this session publishes to.
    pub fn store(&self) -> &SnapshotStore {
        &self.core.store
    }

    /// Poll the device until it can no longer be reopened.
    pub async fn run(self) -> Result<Infallible, SessionError> {
        let Self { core, mut link } = self;
        loop {
            let interruption = match core.drive(&mut link).await {
                Ok(never) => match never {},
                Err(interruption) => interruption,
            };
            warn!(device = %link.name, "connection lost: {interruption}");

            let device = link.name.clone();
            link.close().await;
            sleep(interruption.backoff(core.config.period)).await;

            info!(%device, "reconnecting");
            link = core.open_link().await.map_err(SessionError::Reconnect)?;
            info!(device = %link.name, "device reopened");
        }
    }
}

impl SessionCore {
    async fn open_link(&self) -> DeviceResult<DeviceLink> {
        let connector = Arc::clone(&self.connector);
        let mut connection = tokio::task::spawn_blocking(move || connector.open())
            .await
            .map_err(|e| DeviceError::Task(e.to_string()))??;

        let name = connection.name().to_string();
        let source = connection.line_source()?;
        let (line_tx, lines) = mpsc::channel(self.config.line_capacity.max(1));
        let (failure_tx, failure) = oneshot::channel();
        let reader = tokio::task::spawn_blocking(move || pump_lines(source, line_tx, failure_tx));

        Ok(DeviceLink {
            name,
            connection: Arc::new(Mutex::new(connection)),
            lines,
            failure,
            reader,
        })
    }

    /// Run one connection lifetime. Only returns when the link must be replaced.
    async fn drive(&self, link: &mut DeviceLink) -> Result<Infallible, Interruption> {
        self.warm_up(link).await?;

        let mut phase = Phase::AwaitingScale;
        let mut samples: u64 = 0;
        link.request(phase.command()).await?;

        loop {
            let line = self.next_line(link).await?;
            let parsed = parse_line(&line, phase.requires_ascending());
            sleep(self.config.period).await;

            match parsed {
                Ok(vector) => phase = self.publish(phase, vector, &mut samples),
                Err(reason) => debug!(?phase, "rejected line: {reason}"),
            }
            link.request(phase.command()).await?;
        }
    }

    fn publish(&self, phase: Phase, vector: SampleVector, samples: &mut u64) -> Phase {
        match phase {
            Phase::AwaitingScale => {
                let replaced = self.store.publish_wavelengths(vector);
                info!(replaced, "wavelength scale captured");
                Phase::AwaitingSample
            }
            Phase::AwaitingSample => {
                self.store.publish_intensities(vector);
                *samples += 1;
                if *samples == 1 {
                    info!("sample captured");
                }
                Phase::AwaitingSample
            }
        }
    }

    /// Discard whatever the device prints while it settles after a reset.
    async fn warm_up(&self, link: &mut DeviceLink) -> Result<(), Interruption> {
        let deadline = Instant::now() + self.config.warmup;
        loop {
            tokio::select! {
                biased;
                failure = &mut link.failure => {
                    return Err(failure.unwrap_or(DeviceError::ReaderStopped).into());
                }
                () = sleep_until(deadline) => return Ok(()),
                line = link.lines.recv() => match line {
                    Some(line) => debug!("discarding warm-up output: {:?}", line),
                    None => return Err(DeviceError::ReaderStopped.into()),
                },
            }
        }
    }

    async fn next_line(&self, link: &mut DeviceLink) -> Result<String, Interruption> {
        let waited = self.config.watchdog_timeout();
        tokio::select! {
            biased;
            failure = &mut link.failure => {
                Err(failure.unwrap_or(DeviceError::ReaderStopped).into())
            }
            line = link.lines.recv() => {
                line.ok_or(Interruption::Failed(DeviceError::ReaderStopped))
            }
            () = sleep(waited) => Err(Interruption::Stale { waited }),
        }
    }
}

impl DeviceLink {
    async fn request(&self, command: DeviceCommand) -> DeviceResult<()> {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let mut connection = connection.blocking_lock();
            connection.send(command)
        })
        .await
        .map_err(|e| DeviceError::Task(e.to_string()))?
    }

    /// Drop the connection and wait for the reader to let go of its handle.
    ///
    /// Serial ports are opened exclusively, so the device cannot be reopened
    /// while the reader still holds its clone of the port.
    async fn close(self) {
        let Self {
            connection,
            lines,
            reader,
            ..
        } = self;
        drop(lines);
        drop(connection);
        if let Err(e) = reader.await {
            warn!("line reader task failed: {e}");
        }
    }
}

/// Reader task body: forward lines until the session hangs up or the read fails.
fn pump_lines(
    mut source: Box<dyn LineSource>,
    lines: mpsc::Sender<String>,
    failure: oneshot::Sender<DeviceError>,
) {
    while !lines.is_closed() {
        match source.read_line() {
            Ok(Some(line)) => {
                debug!("got: {:?}", line);
                if lines.blocking_send(line).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => {
                let _ = failure.send(err);
                return;
            }
        }
    }
}
