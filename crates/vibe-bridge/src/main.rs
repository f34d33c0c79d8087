use anyhow::Result;
use clap::Parser;

use vibe_bridge::bridge_runtime::run_bridge;
use vibe_bridge::cli_args::BridgeArgs;

#[tokio::main]
async fn main() -> Result<()> {
    vibe_bridge::bootstrap::init_tracing();
    let args = BridgeArgs::parse();
    run_bridge(&args).await
}
