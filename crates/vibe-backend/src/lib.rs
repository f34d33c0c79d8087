//! Backend collaborators for the vibe bridge.
//!
//! Owns everything that touches the workspace backend: the bounded-retry
//! readiness gate, the HTTP execute client, and the supervised backend
//! process lifecycle. RPC-layer code never reaches the backend except
//! through this crate.

pub mod backend_client;
pub mod backend_error;
pub mod process_supervisor;
pub mod readiness_gate;

pub use backend_client::{BackendClient, DEFAULT_EXEC_TIMEOUT_MS};
pub use backend_error::BackendError;
pub use process_supervisor::{BackendSupervisor, SupervisorConfig};
pub use readiness_gate::{
    ReadinessGate, ReadinessGateConfig, ReadinessState, DEFAULT_READINESS_MAX_ATTEMPTS,
    DEFAULT_READINESS_RETRY_DELAY_MS,
};
