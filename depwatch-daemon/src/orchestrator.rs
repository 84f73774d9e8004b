//! Daemon orchestration -- scanner assembly, command listener and lifecycle.
//!
//! The [`Orchestrator`] loads configuration, builds the dependency scanner,
//! wires its event channel and the on-demand command listener, and manages
//! startup and graceful shutdown.
//!
//! # Startup Order
//!
//! 1. Metrics recorder (if enabled)
//! 2. Dependency scanner (periodic task)
//! 3. Inventory event drain
//! 4. Command listener
//!
//! # Shutdown Order
//!
//! 1. Command listener and event drain (cancellation token)
//! 2. Dependency scanner (in-flight scan completes)

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use depwatch_core::config::DepwatchConfig;
use depwatch_core::pipeline::{HealthStatus, Pipeline};
use depwatch_dependency_scanner::{
    DependencyScanEvent, DependencyScanner, DependencyScannerBuilder, DependencyScannerConfig,
    SnapshotFileSource,
};

use crate::command::CommandListener;
use crate::metrics_server;

/// Inventory event channel capacity.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: DepwatchConfig,
    /// Dependency scanner (None when `[dependency] enabled = false`).
    scanner: Option<DependencyScanner>,
    /// Inventory events produced by the scanner.
    event_rx: Option<mpsc::Receiver<DependencyScanEvent>>,
    /// Cancels the listener and drain tasks.
    cancel: CancellationToken,
    /// Background task handles.
    tasks: Vec<JoinHandle<()>>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from `config_path` and build the orchestrator.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = DepwatchConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    pub fn build_from_config(config: DepwatchConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let (scanner, event_rx) = if config.dependency.enabled {
            tracing::info!("initializing dependency scanner");
            let (scanner, rx) = build_scanner(&config)?;
            (Some(scanner), rx)
        } else {
            tracing::info!("dependency scanner disabled");
            (None, None)
        };

        Ok(Self {
            config,
            scanner,
            event_rx,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            start_time: Instant::now(),
        })
    }

    /// Start everything and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handler failed, shutting down"),
            }
        })
        .await
    }

    /// Start everything and block until `shutdown` resolves.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.shutdown().await
    }

    /// Start the scanner and background tasks.
    pub async fn start(&mut self) -> Result<()> {
        self.cancel = CancellationToken::new();

        let Some(scanner) = self.scanner.as_mut() else {
            tracing::warn!("no modules enabled, daemon is idle");
            return Ok(());
        };

        scanner
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start dependency scanner: {}", e))?;

        if let Some(rx) = self.event_rx.take() {
            self.tasks
                .push(tokio::spawn(drain_events(rx, self.cancel.clone())));
        }

        if self.config.command.enabled {
            let listener = match CommandListener::bind(&self.config.command).await {
                Ok(listener) => listener,
                Err(e) => {
                    // roll back the scanner so a failed start leaves nothing running
                    self.cancel.cancel();
                    for task in self.tasks.drain(..) {
                        if let Err(join_err) = task.await {
                            tracing::warn!(error = %join_err, "background task ended abnormally");
                        }
                    }
                    if let Err(stop_err) = scanner.stop().await {
                        tracing::error!(error = %stop_err, "rollback of dependency scanner failed");
                    }
                    return Err(e);
                }
            };
            let handle = scanner.handle();
            self.tasks
                .push(tokio::spawn(listener.run(handle, self.cancel.clone())));
        }

        tracing::info!("depwatch-daemon running");
        Ok(())
    }

    /// Stop background tasks, then the scanner.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down");
        self.cancel.cancel();

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }

        if let Some(scanner) = self.scanner.as_mut() {
            if scanner.state_name() == "running" {
                scanner
                    .stop()
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to stop dependency scanner: {}", e))?;
            }
        }

        tracing::info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "depwatch-daemon shut down"
        );
        Ok(())
    }

    /// Current health (scanner health, or healthy-idle when disabled).
    pub async fn health(&self) -> HealthStatus {
        match &self.scanner {
            Some(scanner) => scanner.health_check().await,
            None => HealthStatus::Healthy,
        }
    }

    /// Number of background tasks (event drain, command listener) still held.
    pub fn background_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn scanner(&self) -> Option<&DependencyScanner> {
        self.scanner.as_ref()
    }

    pub fn config(&self) -> &DepwatchConfig {
        &self.config
    }
}

/// Build a scanner from the `[dependency]` section, reading loaded classes
/// from the agent snapshot file.
pub fn build_scanner(
    config: &DepwatchConfig,
) -> Result<(DependencyScanner, Option<mpsc::Receiver<DependencyScanEvent>>)> {
    let scanner_config = DependencyScannerConfig::from_core(&config.dependency);
    let source = Arc::new(SnapshotFileSource::new(&scanner_config.snapshot_path));

    DependencyScannerBuilder::new()
        .config(scanner_config)
        .class_source(source)
        .event_channel_capacity(EVENT_CHANNEL_CAPACITY)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build dependency scanner: {}", e))
}

/// Run one scan and return the inventory JSON. Ignores `[dependency] enabled`.
pub async fn scan_once(config: &DepwatchConfig) -> Result<String> {
    let (scanner, _rx) = build_scanner(config)?;
    scanner
        .scan_report()
        .await
        .map_err(|e| anyhow::anyhow!("dependency scan failed: {}", e))
}

/// Consume inventory events so the bounded channel never fills.
async fn drain_events(mut rx: mpsc::Receiver<DependencyScanEvent>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => tracing::debug!(
                    event_id = %event.id,
                    scan_id = %event.report.scan_id,
                    dependencies = event.report.dependencies.len(),
                    "inventory event received"
                ),
                None => break,
            },
            _ = cancel.cancelled() => break,
        }
    }
}

/// Wait for a shutdown signal and return its name.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
