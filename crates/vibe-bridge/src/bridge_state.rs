use std::time::Duration;

use serde_json::Value;
use vibe_backend::{
    BackendClient, BackendError, ReadinessGate, ReadinessGateConfig, ReadinessState,
    DEFAULT_EXEC_TIMEOUT_MS, DEFAULT_READINESS_MAX_ATTEMPTS, DEFAULT_READINESS_RETRY_DELAY_MS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Backend-facing knobs shared by every connection of the bridge.
pub struct BridgeStateConfig {
    pub backend_base_url: String,
    pub readiness_max_attempts: usize,
    pub readiness_retry_delay: Duration,
    pub exec_timeout: Duration,
}

impl BridgeStateConfig {
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        Self {
            backend_base_url: backend_base_url.into(),
            readiness_max_attempts: DEFAULT_READINESS_MAX_ATTEMPTS,
            readiness_retry_delay: Duration::from_millis(DEFAULT_READINESS_RETRY_DELAY_MS),
            exec_timeout: Duration::from_millis(DEFAULT_EXEC_TIMEOUT_MS),
        }
    }
}

/// Cross-connection bridge state: one readiness gate and one execute client
/// shared by the stdio and TCP transports.
#[derive(Debug)]
pub struct BridgeState {
    readiness: ReadinessGate,
    backend: BackendClient,
}

impl BridgeState {
    pub fn new(config: BridgeStateConfig) -> Self {
        let readiness = ReadinessGate::new(ReadinessGateConfig {
            base_url: config.backend_base_url.clone(),
            max_attempts: config.readiness_max_attempts,
            retry_delay: config.readiness_retry_delay,
        });
        let backend = BackendClient::new(config.backend_base_url, config.exec_timeout);
        Self { readiness, backend }
    }

    pub async fn readiness_state(&self) -> ReadinessState {
        self.readiness.state().await
    }

    pub async fn ensure_backend_ready(&self) -> Result<(), BackendError> {
        self.readiness.ensure_ready().await
    }

    pub async fn execute_command(&self, command: &str) -> Result<Value, BackendError> {
        self.backend.execute_command(command).await
    }
}
