//! Configuration system using Figment
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. A TOML file (`bluespx.toml` unless another path is given)
//! 3. Environment variables prefixed with `BLUESPX_`
//!
//! Command-line flags are applied on top by the binary.
//!
//! # Environment Variable Overrides
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! BLUESPX_DEVICE__SELECTOR=Spectryx
//! BLUESPX_SAMPLING__PERIOD=500ms
//! BLUESPX_APPLICATION__DEBUG=true
//! ```
//!
//! # Example
//!
//! ```no_run
//! use bluespx::config::Settings;
//!
//! let settings = Settings::load(None)?;
//! println!("device: {}", settings.device.selector);
//! # Ok::<(), bluespx::error::ConfigError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "bluespx.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "BLUESPX_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Serial device settings
    #[serde(default)]
    pub device: DeviceConfig,
    /// Polling cadence and liveness settings
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// HTTP front end settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging settings
    #[serde(default)]
    pub application: ApplicationConfig,
}

/// Serial device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device filename (`/dev/ttyUSB0`) or a substring of a by-id entry
    pub selector: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Directory of stable device symlinks searched by substring selectors
    pub by_id_dir: PathBuf,
    /// How long DTR is held low when resetting the device
    #[serde(with = "humantime_serde")]
    pub reset_pulse: Duration,
    /// Read timeout of the port; bounds how long the reader blocks per poll
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

/// Sampling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Delay between consecutive device requests
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    /// Watchdog timeout as a multiple of `period`
    pub watchdog_multiplier: u32,
    /// Settling time after each open before the first request
    #[serde(with = "humantime_serde")]
    pub warmup: Duration,
    /// Capacity of the raw line channel between reader and session
    pub line_capacity: usize,
}

/// HTTP front end configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (`host:port`)
    pub addr: String,
    /// Directory served for paths other than `/rpc`
    pub static_dir: PathBuf,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log every raw line and rejection
    pub debug: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            selector: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            by_id_dir: PathBuf::from("/dev/serial/by-id"),
            reset_pulse: Duration::from_millis(250),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            watchdog_multiplier: 12,
            warmup: Duration::from_secs(3),
            line_capacity: 2,
        }
    }
}

impl SamplingConfig {
    /// How long the session waits for a line before reconnecting.
    pub fn watchdog_timeout(&self) -> Duration {
        self.period.saturating_mul(self.watchdog_multiplier)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:8080".to_string(),
            static_dir: PathBuf::from("web"),
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
        }
    }
}

impl Settings {
    /// The layered provider: defaults, TOML file, then environment.
    ///
    /// A missing file is skipped silently, as Figment does for any TOML source.
    pub fn figment(path: Option<&Path>) -> Figment {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract the layered configuration.
    ///
    /// Not validated here: command-line overrides still apply on top, so call
    /// [`Settings::validate`] once the final values are known.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(path).extract()?)
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.selector.trim().is_empty() {
            return Err(ConfigError::Validation(
                "device.selector must not be empty".into(),
            ));
        }
        if self.device.baud_rate == 0 {
            return Err(ConfigError::Validation(
                "device.baud_rate must be greater than zero".into(),
            ));
        }
        if self.device.poll_interval.is_zero() {
            return Err(ConfigError::Validation(
                "device.poll_interval must be greater than zero".into(),
            ));
        }
        if self.sampling.period.is_zero() {
            return Err(ConfigError::Validation(
                "sampling.period must be greater than zero".into(),
            ));
        }
        if self.sampling.watchdog_multiplier == 0 {
            return Err(ConfigError::Validation(
                "sampling.watchdog_multiplier must be greater than zero".into(),
            ));
        }
        if self.sampling.line_capacity == 0 {
            return Err(ConfigError::Validation(
                "sampling.line_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
