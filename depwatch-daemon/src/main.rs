use std::io::Write;

use anyhow::Result;
use clap::Parser;

use depwatch_core::config::DepwatchConfig;
use depwatch_daemon::cli::DaemonCli;
use depwatch_daemon::logging;
use depwatch_daemon::orchestrator::{self, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = DepwatchConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    if cli.once {
        let report = orchestrator::scan_once(&config).await?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{report}")?;
        return Ok(());
    }

    tracing::info!(config = %cli.config.display(), "depwatch-daemon starting");

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await
}
