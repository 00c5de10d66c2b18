//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::config::ApplicationConfig;

/// Filter directive derived from the configuration.
///
/// The debug toggle lowers this crate to `debug` (raw lines, rejections)
/// without making every dependency chatty.
pub fn filter_directive(config: &ApplicationConfig) -> String {
    if config.debug {
        format!("{},bluespx=debug,tower_http=debug", config.log_level)
    } else {
        config.log_level.clone()
    }
}

/// Install the global fmt subscriber. `RUST_LOG` takes precedence when set.
pub fn init(config: &ApplicationConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(config)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_is_log_level() {
        assert_eq!(filter_directive(&ApplicationConfig::default()), "info");
    }

    #[test]
    fn test_debug_toggle_raises_crate_level() {
        let config = ApplicationConfig {
            log_level: "warn".into(),
            debug: true,
        };
        let directive = filter_directive(&config);
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("bluespx=debug"));
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
