use std::time::Duration;

use serde_json::{json, Value};

use crate::backend_error::BackendError;

pub const DEFAULT_EXEC_TIMEOUT_MS: u64 = 30_000;
const BACKEND_EXECUTE_PATH: &str = "/api/mcp/execute";

/// HTTP client for the backend's command-execution endpoint.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    exec_timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, exec_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            exec_timeout,
        }
    }

    /// Forwards one command to the backend and returns its JSON body opaquely.
    ///
    /// The whole exchange runs under a bounded deadline so a hung backend
    /// fails the issuing request instead of stalling its connection forever.
    pub async fn execute_command(&self, command: &str) -> Result<Value, BackendError> {
        let endpoint = format!("{}{BACKEND_EXECUTE_PATH}", self.base_url);
        let exchange = async {
            let response = self
                .client
                .post(&endpoint)
                .json(&json!({ "command": command }))
                .send()
                .await
                .map_err(|error| BackendError::ExecFailed {
                    detail: format!("request failed: {error}"),
                })?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(BackendError::ExecFailed {
                    detail: format!("backend returned {status}: {}", body.trim()),
                });
            }
            response
                .json::<Value>()
                .await
                .map_err(|error| BackendError::ExecFailed {
                    detail: format!("response body was not JSON: {error}"),
                })
        };

        tokio::time::timeout(self.exec_timeout, exchange)
            .await
            .map_err(|_| BackendError::ExecTimeout {
                timeout_ms: u64::try_from(self.exec_timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}
