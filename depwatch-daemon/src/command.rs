//! On-demand command listener.
//!
//! Newline-delimited TCP protocol, one response line per request line:
//!
//! | request | response                         |
//! |---------|----------------------------------|
//! | `get`   | inventory JSON array (fresh scan) |
//! | `ping`  | `pong`                           |
//! | other   | `error: <reason>`                |
//!
//! Connections are limited by a semaphore and closed after
//! `connection_timeout_secs` of inactivity.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use depwatch_core::config::CommandConfig;
use depwatch_dependency_scanner::ScanHandle;

/// Longest accepted request line in bytes.
pub const MAX_COMMAND_LEN: usize = 256;

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get,
    Ping,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case("get") {
            Self::Get
        } else if line.eq_ignore_ascii_case("ping") {
            Self::Ping
        } else {
            Self::Unknown(line.to_owned())
        }
    }

    /// Execute the command and build the response line (without the newline).
    pub async fn execute(&self, handle: &ScanHandle) -> String {
        match self {
            Self::Get => match handle.scan_report().await {
                Ok(json) => json,
                Err(e) => format!("error: {e}"),
            },
            Self::Ping => "pong".to_owned(),
            Self::Unknown(other) => format!("error: unknown command '{other}'"),
        }
    }
}

/// TCP listener serving on-demand scan requests.
pub struct CommandListener {
    listener: TcpListener,
    max_connections: usize,
    connection_timeout: Duration,
}

impl CommandListener {
    /// Bind the listening socket.
    pub async fn bind(config: &CommandConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind command listener to {}: {}", config.bind_addr, e))?;

        Ok(Self {
            listener,
            max_connections: config.max_connections,
            connection_timeout: Duration::from_secs(config.connection_timeout_secs),
        })
    }

    /// Actual bound address (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `cancel` fires.
    pub async fn run(self, handle: ScanHandle, cancel: CancellationToken) {
        let addr = self
            .listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_owned());
        info!(bind_addr = %addr, "command listener started");

        let semaphore = Arc::new(Semaphore::new(self.max_connections));

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "command listener accept failed");
                            continue;
                        }
                    };

                    let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                        warn!(peer = %peer, "max command connections reached, rejecting");
                        continue;
                    };

                    debug!(peer = %peer, "command connection accepted");

                    let handle = handle.clone();
                    let cancel = cancel.clone();
                    let idle = self.connection_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handle, idle, cancel).await {
                            debug!(peer = %peer, error = %e, "command connection ended with error");
                        }
                        drop(permit);
                    });
                }
                _ = cancel.cancelled() => break,
            }
        }

        info!("command listener stopped");
    }
}

async fn handle_connection(
    stream: TcpStream,
    handle: ScanHandle,
    idle: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();

        tokio::select! {
            result = timeout(idle, reader.read_line(&mut line)) => {
                match result {
                    Ok(Ok(0)) => break,
                    Ok(Ok(_)) => {
                        if line.len() > MAX_COMMAND_LEN {
                            write_half.write_all(b"error: request too long\n").await?;
                            break;
                        }
                        if line.trim().is_empty() {
                            continue;
                        }

                        let mut response = Command::parse(&line).execute(&handle).await;
                        response.push('\n');
                        write_half.write_all(response.as_bytes()).await?;
                    }
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => {
                        debug!("command connection idle timeout");
                        break;
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    write_half.shutdown().await.ok();
    Ok(())
}
