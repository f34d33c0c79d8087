use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use vibe_core::{encode_response_line, LineFramer};

use crate::bridge_state::BridgeState;
use crate::dispatcher::dispatch_line;

const READ_CHUNK_BYTES: usize = 4096;

/// What a connection does when a caller requests `shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Flush the response, then end the stream. Used by the stdio
    /// transport, where shutdown is process-fatal for the caller above us.
    EndStream,
    /// Flush the response and keep serving. Used by TCP connections,
    /// which acknowledge shutdown without terminating anything.
    AcknowledgeOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Counters for one connection's lifetime, logged when it closes.
pub struct ServeReport {
    pub processed_lines: u64,
    pub error_count: u64,
    pub shutdown_requested: bool,
}

/// Serves framed JSON-RPC lines from `reader` to `writer` until EOF, a
/// transport error, or a policy-honored shutdown request.
///
/// Lines are dispatched strictly in arrival order; a line's response is
/// written and flushed before the next line is parsed. Dispatch failures
/// become envelopes and never end the loop.
pub async fn serve_line_stream<R, W>(
    mut reader: R,
    mut writer: W,
    state: Arc<BridgeState>,
    policy: ShutdownPolicy,
) -> Result<ServeReport>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut framer = LineFramer::new();
    let mut report = ServeReport::default();
    let mut chunk = [0_u8; READ_CHUNK_BYTES];

    loop {
        let read = reader
            .read(&mut chunk)
            .await
            .context("failed to read from transport")?;
        if read == 0 {
            return Ok(report);
        }

        for line in framer.push_bytes(&chunk[..read]) {
            let outcome = dispatch_line(&state, &line).await;
            report.processed_lines = report.processed_lines.saturating_add(1);
            if outcome.is_error() {
                report.error_count = report.error_count.saturating_add(1);
            }

            let encoded = encode_response_line(&outcome.frame);
            writer
                .write_all(encoded.as_bytes())
                .await
                .context("failed to write response to transport")?;
            writer
                .flush()
                .await
                .context("failed to flush response to transport")?;

            if outcome.shutdown_requested {
                report.shutdown_requested = true;
                if policy == ShutdownPolicy::EndStream {
                    return Ok(report);
                }
            }
        }
    }
}
