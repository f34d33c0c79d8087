use clap::Parser;
use vibe_backend::{
    DEFAULT_EXEC_TIMEOUT_MS, DEFAULT_READINESS_MAX_ATTEMPTS, DEFAULT_READINESS_RETRY_DELAY_MS,
};

pub const DEFAULT_BACKEND_PORT: u16 = 3000;

/// JSON-RPC bridge between a desktop assistant and the vibe workspace backend.
#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "vibe-bridge", version)]
pub struct BridgeArgs {
    /// Backend HTTP port; also exported as PORT to the spawned backend.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_BACKEND_PORT, value_parser = parse_positive_u16)]
    pub port: u16,

    /// Command used to launch the supervised backend process. When absent
    /// the bridge assumes an externally managed backend.
    #[arg(long)]
    pub backend_command: Option<String>,

    /// Arguments passed to the backend command; repeatable.
    #[arg(long = "backend-arg")]
    pub backend_args: Vec<String>,

    /// Health-probe attempts before a dependent request fails.
    #[arg(long, default_value_t = DEFAULT_READINESS_MAX_ATTEMPTS, value_parser = parse_positive_usize)]
    pub readiness_attempts: usize,

    /// Delay between health-probe attempts, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_READINESS_RETRY_DELAY_MS, value_parser = parse_positive_u64)]
    pub readiness_delay_ms: u64,

    /// Deadline for one backend execute call, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_EXEC_TIMEOUT_MS, value_parser = parse_positive_u64)]
    pub exec_timeout_ms: u64,

    /// Serve only stdio; skips the loopback TCP listener that normally
    /// runs alongside it.
    #[arg(long, default_value_t = false)]
    pub no_tcp: bool,
}

impl BridgeArgs {
    /// Base URL used for both the health probe and the execute endpoint.
    pub fn backend_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

fn parse_positive_u16(raw: &str) -> Result<u16, String> {
    let value = raw
        .parse::<u16>()
        .map_err(|_| format!("'{raw}' is not a valid port"))?;
    if value == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(value)
}

fn parse_positive_u64(raw: &str) -> Result<u64, String> {
    let value = raw
        .parse::<u64>()
        .map_err(|_| format!("'{raw}' is not a valid positive integer"))?;
    if value == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(value)
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let value = raw
        .parse::<usize>()
        .map_err(|_| format!("'{raw}' is not a valid positive integer"))?;
    if value == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(value)
}
