use std::sync::Arc;

use anyhow::Result;

use crate::bridge_state::BridgeState;
use crate::serve_loop::{serve_line_stream, ServeReport, ShutdownPolicy};

/// Serves the persistent stdin/stdout connection.
///
/// Returns once stdin reaches EOF or a caller sends `shutdown`; the caller
/// above then tears down the supervised backend and exits. Diagnostics go
/// to stderr only, stdout carries nothing but response frames.
pub async fn serve_stdio(state: Arc<BridgeState>) -> Result<ServeReport> {
    let report = serve_line_stream(
        tokio::io::stdin(),
        tokio::io::stdout(),
        state,
        ShutdownPolicy::EndStream,
    )
    .await?;
    tracing::info!(
        processed_lines = report.processed_lines,
        error_count = report.error_count,
        shutdown_requested = report.shutdown_requested,
        "stdio transport closed"
    );
    Ok(report)
}
