//! The vibe bridge binary's internals.
//!
//! Wires the protocol crate and the backend collaborators into two
//! transports sharing one dispatcher: a persistent stdio connection and an
//! optional loopback TCP listener.

pub mod bootstrap;
pub mod bridge_runtime;
pub mod bridge_state;
pub mod cli_args;
pub mod dispatcher;
pub mod serve_loop;
pub mod stdio_transport;
pub mod tcp_transport;

pub use bridge_state::{BridgeState, BridgeStateConfig};
pub use cli_args::BridgeArgs;
pub use dispatcher::{dispatch_line, BridgeMethod, DispatchOutcome};
pub use serve_loop::{serve_line_stream, ServeReport, ShutdownPolicy};
pub use tcp_transport::{TcpTransport, TCP_BIND_ADDRESS};
