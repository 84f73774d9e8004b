//! Logging initialization for depwatch-daemon.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `DepwatchConfig`. `RUST_LOG` takes precedence over `log_level`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use depwatch_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default for production)
/// * `"pretty"` - Human-readable output (for development)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // logs go to stderr so `--once` keeps stdout for the report
    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e)
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
                })?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                config.log_format
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_is_rejected() {
        let config = GeneralConfig {
            log_level: "info".to_owned(),
            log_format: "xml".to_owned(),
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }
}
