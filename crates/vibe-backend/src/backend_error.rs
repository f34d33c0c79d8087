use thiserror::Error;

/// Failures surfaced by backend collaborators.
///
/// The dispatcher maps every variant onto a JSON-RPC internal error; the
/// display text ends up embedded in the error envelope message.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("health check failed after {attempts} attempt(s): {detail}")]
    Unavailable { attempts: usize, detail: String },
    #[error("execute request failed: {detail}")]
    ExecFailed { detail: String },
    #[error("execute request timed out after {timeout_ms}ms")]
    ExecTimeout { timeout_ms: u64 },
}
