use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::bridge_state::BridgeState;
use crate::serve_loop::{serve_line_stream, ShutdownPolicy};

pub const TCP_BIND_ADDRESS: &str = "127.0.0.1:0";

/// Loopback TCP listener serving the same method table as stdio.
///
/// Every accepted connection gets its own framer and its own in-order
/// dispatch; connections run concurrently against the shared state. A
/// `shutdown` request on a TCP connection is acknowledged but never
/// terminates the process or the connection.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    pub async fn bind(address: &str) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind tcp transport on {address}"))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("failed to read tcp transport local address")
    }

    /// Accept loop; runs until the task is dropped.
    pub async fn run(self, state: Arc<BridgeState>) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tracing::info!(%peer, "tcp connection accepted");
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        match serve_line_stream(
                            reader,
                            writer,
                            state,
                            ShutdownPolicy::AcknowledgeOnly,
                        )
                        .await
                        {
                            Ok(report) => tracing::info!(
                                %peer,
                                processed_lines = report.processed_lines,
                                error_count = report.error_count,
                                "tcp connection closed"
                            ),
                            Err(error) => {
                                tracing::warn!(%peer, %error, "tcp connection failed");
                            }
                        }
                    });
                }
                Err(error) => {
                    tracing::warn!(%error, "tcp accept failed");
                }
            }
        }
    }
}
