use std::collections::BTreeMap;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

pub const DEFAULT_RESTART_BACKOFF_BASE_MS: u64 = 200;
pub const DEFAULT_RESTART_BACKOFF_CAP_MS: u64 = 10_000;
pub const DEFAULT_RESTART_FAILURE_LIMIT: u32 = 5;

/// A child that survives this long counts as a healthy run and resets the
/// consecutive-failure counter.
const HEALTHY_RUN_THRESHOLD: Duration = Duration::from_secs(5);
const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
/// Launch and restart parameters for the supervised backend process.
pub struct SupervisorConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Extra environment on top of the inherited one (the bridge sets PORT).
    pub env: BTreeMap<String, String>,
    pub restart_backoff_base_ms: u64,
    pub restart_backoff_cap_ms: u64,
    /// Consecutive fast failures that open the circuit breaker.
    pub restart_failure_limit: u32,
}

impl SupervisorConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
            restart_backoff_base_ms: DEFAULT_RESTART_BACKOFF_BASE_MS,
            restart_backoff_cap_ms: DEFAULT_RESTART_BACKOFF_CAP_MS,
            restart_failure_limit: DEFAULT_RESTART_FAILURE_LIMIT,
        }
    }
}

#[derive(Debug)]
struct SupervisorShared {
    config: SupervisorConfig,
    shutting_down: AtomicBool,
    child: Mutex<Option<Child>>,
}

/// Owns exactly one backend child process at a time.
///
/// The monitor task relaunches the child after a non-zero exit with
/// exponential backoff; a clean exit is treated as deliberate termination.
/// After `restart_failure_limit` consecutive fast failures the breaker
/// opens and the supervisor stops relaunching — the readiness gate then
/// reports the backend unavailable to callers. Shutdown kills the current
/// child exactly once.
#[derive(Debug)]
pub struct BackendSupervisor {
    shared: Arc<SupervisorShared>,
    monitor: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BackendSupervisor {
    /// Spawns the backend child and the monitor task that owns restarts.
    pub async fn launch(config: SupervisorConfig) -> Result<Self> {
        if config.command.trim().is_empty() {
            bail!("backend command must be non-empty");
        }
        let shared = Arc::new(SupervisorShared {
            config,
            shutting_down: AtomicBool::new(false),
            child: Mutex::new(None),
        });
        spawn_backend_child(&shared).await?;
        let monitor = tokio::spawn(run_monitor_loop(Arc::clone(&shared)));
        Ok(Self {
            shared,
            monitor: Mutex::new(Some(monitor)),
        })
    }

    /// OS pid of the current child, if one is running.
    pub async fn child_pid(&self) -> Option<u32> {
        let slot = self.shared.child.lock().await;
        slot.as_ref().and_then(Child::id)
    }

    /// Kills the current child exactly once and stops the restart loop.
    ///
    /// Idempotent: later calls observe the shutdown flag and return.
    pub async fn shutdown(&self) {
        if self.shared.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut slot = self.shared.child.lock().await;
            if let Some(mut child) = slot.take() {
                if let Err(error) = child.kill().await {
                    tracing::warn!(%error, "failed to kill backend process");
                } else {
                    tracing::info!("backend process terminated on shutdown");
                }
            }
        }
        let mut monitor = self.monitor.lock().await;
        if let Some(handle) = monitor.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

async fn run_monitor_loop(shared: Arc<SupervisorShared>) {
    let mut consecutive_failures: u32 = 0;
    loop {
        let started = Instant::now();
        let status = wait_for_current_child(&shared).await;
        if shared.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        match status {
            Ok(status) if status.success() => {
                tracing::info!("backend process exited cleanly; not restarting");
                return;
            }
            Ok(status) => {
                if started.elapsed() >= HEALTHY_RUN_THRESHOLD {
                    consecutive_failures = 0;
                }
                consecutive_failures = consecutive_failures.saturating_add(1);
                tracing::warn!(
                    %status,
                    consecutive_failures,
                    "backend process exited with failure"
                );
            }
            Err(error) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                tracing::warn!(%error, consecutive_failures, "failed to monitor backend process");
            }
        }

        let failure_limit = shared.config.restart_failure_limit.max(1);
        if consecutive_failures >= failure_limit {
            tracing::error!(
                failure_limit,
                "backend restart circuit breaker opened; no further relaunches"
            );
            return;
        }

        let delay = restart_backoff_delay(&shared.config, consecutive_failures);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "relaunching backend process after backoff"
        );
        tokio::time::sleep(delay).await;
        if shared.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        if let Err(error) = spawn_backend_child(&shared).await {
            tracing::error!(%error, "failed to relaunch backend process");
            consecutive_failures = consecutive_failures.saturating_add(1);
            if consecutive_failures >= failure_limit {
                tracing::error!(
                    failure_limit,
                    "backend restart circuit breaker opened; no further relaunches"
                );
                return;
            }
        }
    }
}

/// Polls the shared child slot until the current child exits.
///
/// The slot lock is only held per poll so shutdown can take the handle and
/// kill it in between polls; a missing handle ends the wait.
async fn wait_for_current_child(shared: &SupervisorShared) -> Result<ExitStatus> {
    loop {
        {
            let mut slot = shared.child.lock().await;
            let Some(child) = slot.as_mut() else {
                bail!("backend child handle is gone");
            };
            match child.try_wait() {
                Ok(Some(status)) => {
                    slot.take();
                    return Ok(status);
                }
                Ok(None) => {}
                Err(error) => {
                    slot.take();
                    return Err(error).context("failed to poll backend child status");
                }
            }
        }
        tokio::time::sleep(CHILD_POLL_INTERVAL).await;
    }
}

async fn spawn_backend_child(shared: &SupervisorShared) -> Result<()> {
    let config = &shared.config;
    let mut command = Command::new(config.command.trim());
    command.args(&config.args);
    for (key, value) in &config.env {
        command.env(key, value);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn backend command '{}'", config.command))?;
    if let Some(stdout) = child.stdout.take() {
        spawn_diagnostic_relay(stdout, "backend stdout");
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_diagnostic_relay(stderr, "backend stderr");
    }
    if let Some(pid) = child.id() {
        tracing::info!(pid, command = %config.command, "backend process started");
    }

    let mut slot = shared.child.lock().await;
    *slot = Some(child);
    Ok(())
}

/// Relays one child output stream into this process's diagnostic log.
///
/// Child output never reaches RPC responses; it is operator-facing only.
fn spawn_diagnostic_relay<R>(reader: R, label: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    tracing::info!("{label}: {trimmed}");
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(%error, "{label} relay failed");
                    break;
                }
            }
        }
    });
}

fn restart_backoff_delay(config: &SupervisorConfig, consecutive_failures: u32) -> Duration {
    let exponent = consecutive_failures.saturating_sub(1).min(16);
    let multiplier = 1_u64 << exponent;
    let delay_ms = config
        .restart_backoff_base_ms
        .saturating_mul(multiplier)
        .min(config.restart_backoff_cap_ms.max(config.restart_backoff_base_ms));
    Duration::from_millis(delay_ms)
}
