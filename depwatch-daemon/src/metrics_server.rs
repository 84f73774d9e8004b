//! Prometheus metrics HTTP server.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`
//! to expose the scanner counters defined in `depwatch_core::metrics`.

use std::net::SocketAddr;

use anyhow::Result;
use depwatch_core::config::MetricsConfig;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the global metrics recorder and start the HTTP listener.
///
/// Call once per process, before the scanner is built.
///
/// # Errors
///
/// - Unsupported endpoint path
/// - Invalid listen address
/// - Socket binding fails or a global recorder is already installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    if config.endpoint != "/metrics" {
        return Err(anyhow::anyhow!(
            "unsupported metrics endpoint '{}': only '/metrics' is currently supported",
            config.endpoint
        ));
    }

    let addr: SocketAddr = format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces; restrict listen_addr in untrusted networks"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    depwatch_core::metrics::describe_all();

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");

    Ok(())
}
