use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use vibe_backend::{BackendSupervisor, SupervisorConfig};

use crate::bridge_state::{BridgeState, BridgeStateConfig};
use crate::cli_args::BridgeArgs;
use crate::stdio_transport::serve_stdio;
use crate::tcp_transport::{TcpTransport, TCP_BIND_ADDRESS};

/// Builds the shared state configured by the CLI.
pub fn build_state(args: &BridgeArgs) -> Arc<BridgeState> {
    let mut config = BridgeStateConfig::new(args.backend_base_url());
    config.readiness_max_attempts = args.readiness_attempts;
    config.readiness_retry_delay = Duration::from_millis(args.readiness_delay_ms);
    config.exec_timeout = Duration::from_millis(args.exec_timeout_ms);
    Arc::new(BridgeState::new(config))
}

fn supervisor_config(args: &BridgeArgs, command: &str) -> SupervisorConfig {
    let mut config = SupervisorConfig::new(command, args.backend_args.clone());
    config
        .env
        .insert("PORT".to_string(), args.port.to_string());
    config
}

/// Runs the bridge until stdin closes, a caller sends `shutdown`, or a
/// termination signal arrives.
///
/// The stdio serve loop flushes its final response before returning, so
/// the supervised backend is only killed after the shutdown envelope has
/// reached the caller.
pub async fn run_bridge(args: &BridgeArgs) -> Result<()> {
    let state = build_state(args);

    let supervisor = match args.backend_command.as_deref() {
        Some(command) => Some(BackendSupervisor::launch(supervisor_config(args, command)).await?),
        None => {
            tracing::info!(
                backend = %args.backend_base_url(),
                "no backend command configured; expecting an externally managed backend"
            );
            None
        }
    };

    if !args.no_tcp {
        let transport = TcpTransport::bind(TCP_BIND_ADDRESS).await?;
        tracing::info!(address = %transport.local_addr()?, "tcp transport listening");
        tokio::spawn(transport.run(Arc::clone(&state)));
    }

    tokio::select! {
        served = serve_stdio(Arc::clone(&state)) => {
            match served {
                Ok(report) if report.shutdown_requested => {
                    tracing::info!("shutdown requested over stdio");
                }
                Ok(_) => tracing::info!("stdin closed"),
                Err(error) => tracing::warn!(%error, "stdio transport failed"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("termination signal received");
        }
    }

    if let Some(supervisor) = &supervisor {
        supervisor.shutdown().await;
    }
    Ok(())
}
