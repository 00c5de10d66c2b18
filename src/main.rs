//! bluespx: monitors a Spectryx Blue visual spectrum analyzer and serves its
//! current scale and sample over HTTP.
//!
//! ```bash
//! bluespx --tty Spectryx --period 500ms --addr 0.0.0.0:8080
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use humantime_serde::re::humantime;
use tracing::{error, info};

use bluespx::adapters::SerialConnector;
use bluespx::config::Settings;
use bluespx::data::SnapshotStore;
use bluespx::session::DeviceSession;
use bluespx::{logging, server};

#[derive(Parser, Debug)]
#[command(name = "bluespx", version, about)]
struct Cli {
    /// Configuration file (defaults to ./bluespx.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// tty identifier: a device filename, or a substring of a /dev/serial/by-id entry
    #[arg(long)]
    tty: Option<String>,

    /// Preferred baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Time between spectrum samples (e.g. "1s", "500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    period: Option<Duration>,

    /// Webserver address
    #[arg(long)]
    addr: Option<String>,

    /// Directory of static files for the web page
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Enable for more log output
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// CLI flags sit above every other configuration layer.
    fn apply(&self, settings: &mut Settings) {
        if let Some(tty) = &self.tty {
            settings.device.selector = tty.clone();
        }
        if let Some(baud) = self.baud {
            settings.device.baud_rate = baud;
        }
        if let Some(period) = self.period {
            settings.sampling.period = period;
        }
        if let Some(addr) = &self.addr {
            settings.server.addr = addr.clone();
        }
        if let Some(dir) = &self.static_dir {
            settings.server.static_dir = dir.clone();
        }
        if self.debug {
            settings.application.debug = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut settings);
    settings.validate()?;

    logging::init(&settings.application)?;

    let store = SnapshotStore::new();
    let connector = Arc::new(SerialConnector::new(settings.device.clone()));
    let session = DeviceSession::open(connector, settings.sampling.clone(), store.clone())
        .await
        .with_context(|| format!("failed to open {:?}", settings.device.selector))?;

    info!(
        period = ?settings.sampling.period,
        watchdog = ?settings.sampling.watchdog_timeout(),
        "monitoring spectrum analyzer"
    );

    tokio::select! {
        result = session.run() => {
            let err = match result {
                Ok(never) => match never {},
                Err(err) => err,
            };
            error!("device session ended: {err}");
            Err(err.into())
        }
        result = server::serve(&settings.server, store) => {
            result?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_before_validation() {
        let mut settings = Settings::default();
        settings.sampling.period = Duration::ZERO;
        settings.device.selector = String::new();
        assert!(settings.validate().is_err());

        let cli = Cli::parse_from(["bluespx", "--period", "250ms", "--tty", "Spectryx", "--debug"]);
        cli.apply(&mut settings);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.sampling.period, Duration::from_millis(250));
        assert_eq!(settings.device.selector, "Spectryx");
        assert!(settings.application.debug);
    }
}
