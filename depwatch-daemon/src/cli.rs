//! CLI argument definitions for depwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use depwatch_core::config::DepwatchConfig;

/// depwatch dependency inventory daemon.
///
/// Periodically identifies the JAR archives loaded by a JVM and reports
/// a deduplicated dependency inventory.
#[derive(Parser, Debug)]
#[command(name = "depwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to depwatch.toml configuration file.
    #[arg(short, long, default_value = "/etc/depwatch/depwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Run a single scan, print the inventory JSON to stdout and exit.
    #[arg(long, conflicts_with = "validate")]
    pub once: bool,
}

impl DaemonCli {
    /// Apply CLI overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut DepwatchConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
