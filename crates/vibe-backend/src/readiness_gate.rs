use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::backend_error::BackendError;

pub const DEFAULT_READINESS_MAX_ATTEMPTS: usize = 10;
pub const DEFAULT_READINESS_RETRY_DELAY_MS: u64 = 500;
const BACKEND_STATUS_PATH: &str = "/api/status";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Bounded-retry parameters for the backend health probe.
pub struct ReadinessGateConfig {
    pub base_url: String,
    pub max_attempts: usize,
    pub retry_delay: Duration,
}

impl ReadinessGateConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_attempts: DEFAULT_READINESS_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_READINESS_RETRY_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Last observed backend readiness.
pub enum ReadinessState {
    /// Never probed.
    Unknown,
    /// Last probe reported ok; sticky until the process exits.
    Ready,
    /// The attempt budget was exhausted; the next dependent call re-probes.
    Unreachable,
}

/// Gate consulted before any backend-dependent method runs.
///
/// Polls the backend status endpoint with a fixed interval and attempt cap.
/// The gate is lazy: it probes only when asked and only while not already
/// ready. Exhausting the budget fails the current request, never the server.
#[derive(Debug)]
pub struct ReadinessGate {
    client: reqwest::Client,
    config: ReadinessGateConfig,
    state: Mutex<ReadinessState>,
}

impl ReadinessGate {
    pub fn new(config: ReadinessGateConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            state: Mutex::new(ReadinessState::Unknown),
        }
    }

    pub async fn state(&self) -> ReadinessState {
        *self.state.lock().await
    }

    /// Blocks until the backend reports ready or the attempt budget is spent.
    ///
    /// The state lock is held across the whole probe run so concurrent
    /// callers do not multiply outbound probe traffic; they observe the
    /// first caller's outcome instead.
    pub async fn ensure_ready(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        if *state == ReadinessState::Ready {
            return Ok(());
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_detail = "no probe attempted".to_string();
        for attempt in 1..=max_attempts {
            match self.probe_status().await {
                Ok(()) => {
                    *state = ReadinessState::Ready;
                    tracing::debug!(attempt, "backend reported ready");
                    return Ok(());
                }
                Err(detail) => {
                    tracing::debug!(attempt, %detail, "backend not ready yet");
                    last_detail = detail;
                }
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        *state = ReadinessState::Unreachable;
        Err(BackendError::Unavailable {
            attempts: max_attempts,
            detail: last_detail,
        })
    }

    async fn probe_status(&self) -> Result<(), String> {
        let endpoint = format!("{}{BACKEND_STATUS_PATH}", self.config.base_url);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|error| format!("status request failed: {error}"))?;
        if !response.status().is_success() {
            return Err(format!("status endpoint returned {}", response.status()));
        }
        let payload = response
            .json::<Value>()
            .await
            .map_err(|error| format!("status body was not JSON: {error}"))?;
        if payload.get("status").and_then(Value::as_str) == Some("ok") {
            Ok(())
        } else {
            Err("status body did not report ok".to_string())
        }
    }
}
